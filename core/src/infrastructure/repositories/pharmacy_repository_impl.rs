//! Postgres-backed `PharmacyRepository` (§3, §6 "pharmacies" table).

use async_trait::async_trait;
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Pharmacy;
use crate::domain::repositories::PharmacyRepository;
use crate::infrastructure::database::queries::pharmacies::{PHARMACY_FIND_BY_ID, PHARMACY_LIST_ALL};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

#[derive(Debug, FromRow)]
struct PharmacyRow {
    id: Uuid,
    name: String,
    settings: serde_json::Value,
}

impl From<PharmacyRow> for Pharmacy {
    fn from(row: PharmacyRow) -> Self {
        let settings = match row.settings {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => Default::default(),
        };
        Pharmacy {
            id: row.id,
            name: row.name,
            settings,
        }
    }
}

pub struct PharmacyRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl PharmacyRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl PharmacyRepository for PharmacyRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Pharmacy>> {
        sqlx::query_as::<_, PharmacyRow>(PHARMACY_FIND_BY_ID)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "pharmacy")
            .map(|row| row.map(Pharmacy::from))
    }

    async fn list_all(&self) -> AppResult<Vec<Pharmacy>> {
        sqlx::query_as::<_, PharmacyRow>(PHARMACY_LIST_ALL)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("list", "pharmacy")
            .map(|rows| rows.into_iter().map(Pharmacy::from).collect())
    }
}
