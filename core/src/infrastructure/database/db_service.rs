//! Thin wrapper around a `sqlx::PgPool`, mirroring the teacher's
//! `infrastructure::database::DatabaseService` (§6 "single connection
//! string").

use sqlx::PgPool;
use std::time::Duration;

use crate::infrastructure::database::queries::common::HEALTH_CHECK;
use crate::shared::AppResult;

pub struct DatabaseService {
    pool: PgPool,
}

impl DatabaseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// §9 "the only schema-touching bootstrap call made at startup".
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query(HEALTH_CHECK)
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(crate::shared::AppError::Database)
    }

    pub async fn health_check_with_timeout(&self, timeout: Duration) -> AppResult<bool> {
        tokio::time::timeout(timeout, self.health_check())
            .await
            .map_err(|_| crate::shared::AppError::Internal("database health check timeout".to_string()))?
    }

    pub fn active_connections(&self) -> u32 {
        self.pool.size()
    }

    pub fn idle_connections(&self) -> usize {
        self.pool.num_idle()
    }
}

/// §6 "Environment": a single connection string, no SSL configuration
/// beyond what the URL itself carries.
pub async fn create_pool(database_url: &str) -> AppResult<PgPool> {
    PgPool::connect(database_url).await.map_err(crate::shared::AppError::Database)
}

pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> AppResult<PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect(database_url)
        .await
        .map_err(crate::shared::AppError::Database)
}
