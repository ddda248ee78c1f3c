//! Postgres-backed `IngestionLogRepository` (§4.1, §6, §7).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{IngestionLog, IngestionStatus};
use crate::domain::repositories::IngestionLogRepository;
use crate::infrastructure::database::queries::ingestion_log::INGESTION_LOG_INSERT;
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

#[derive(Debug, FromRow)]
struct IngestionLogRow {
    id: Uuid,
    pharmacy_id: Uuid,
    source_type: String,
    file_name: String,
    records_received: i64,
    records_processed: i64,
    records_failed: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<IngestionLogRow> for IngestionLog {
    fn from(row: IngestionLogRow) -> Self {
        let status = match row.status.as_str() {
            "success" => IngestionStatus::Success,
            "partial" => IngestionStatus::Partial,
            _ => IngestionStatus::Failed,
        };
        IngestionLog {
            id: row.id,
            pharmacy_id: row.pharmacy_id,
            source_type: row.source_type,
            file_name: row.file_name,
            records_received: row.records_received,
            records_processed: row.records_processed,
            records_failed: row.records_failed,
            status,
            created_at: row.created_at,
        }
    }
}

pub struct IngestionLogRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl IngestionLogRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl IngestionLogRepository for IngestionLogRepositoryImpl {
    async fn create(&self, log: IngestionLog) -> AppResult<IngestionLog> {
        let row = sqlx::query_as::<_, IngestionLogRow>(INGESTION_LOG_INSERT)
            .bind(log.id)
            .bind(log.pharmacy_id)
            .bind(&log.source_type)
            .bind(&log.file_name)
            .bind(log.records_received)
            .bind(log.records_processed)
            .bind(log.records_failed)
            .bind(log.status.as_str())
            .bind(log.created_at)
            .fetch_one(self.database_service.pool())
            .await
            .map_db_error("insert", "ingestion_log")?;
        Ok(row.into())
    }
}
