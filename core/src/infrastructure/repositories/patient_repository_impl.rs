//! Postgres-backed `PatientRepository` (§3, §4.1 two-phase load, §6
//! "patients" table).

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Patient;
use crate::domain::repositories::{PatientRepository, PatientUpsert};
use crate::infrastructure::database::queries::patients::{PATIENT_FIND_BY_HASH, PATIENT_FIND_BY_ID};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

#[derive(Debug, FromRow)]
struct PatientRow {
    id: Uuid,
    pharmacy_id: Uuid,
    patient_hash: String,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    chronic_conditions: Vec<String>,
    primary_bin: Option<String>,
    primary_group: Option<String>,
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        Patient {
            id: row.id,
            pharmacy_id: row.pharmacy_id,
            patient_hash: row.patient_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            chronic_conditions: row.chronic_conditions.into_iter().collect::<BTreeSet<_>>(),
            primary_bin: row.primary_bin,
            primary_group: row.primary_group,
        }
    }
}

#[derive(Debug, FromRow)]
struct PatientHashId {
    patient_hash: String,
    id: Uuid,
}

pub struct PatientRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl PatientRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl PatientRepository for PatientRepositoryImpl {
    /// §4.1 step 2: one multi-row `INSERT ... ON CONFLICT` statement per
    /// batch (50-500 rows), built with `QueryBuilder::push_values` so the
    /// round-trip count matches the batch count, not the row count.
    async fn batch_upsert(&self, rows: &[PatientUpsert]) -> AppResult<Vec<(String, Uuid)>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = sqlx::QueryBuilder::new(
            "INSERT INTO patients (id, pharmacy_id, patient_hash, first_name, last_name, \
             date_of_birth, chronic_conditions, primary_bin, primary_group, created_at, updated_at) ",
        );

        builder.push_values(rows, |mut b, row| {
            let conditions: Vec<String> = row.chronic_conditions.iter().cloned().collect();
            b.push_bind(Uuid::new_v4())
                .push_bind(row.pharmacy_id)
                .push_bind(&row.patient_hash)
                .push_bind(&row.first_name)
                .push_bind(&row.last_name)
                .push_bind(row.date_of_birth)
                .push_bind(conditions)
                .push_bind(&row.primary_bin)
                .push_bind(&row.primary_group)
                .push("now()")
                .push("now()");
        });

        builder.push(
            " ON CONFLICT (pharmacy_id, patient_hash) DO UPDATE SET \
              first_name = EXCLUDED.first_name, \
              last_name = EXCLUDED.last_name, \
              date_of_birth = COALESCE(EXCLUDED.date_of_birth, patients.date_of_birth), \
              chronic_conditions = (SELECT array(SELECT DISTINCT unnest(patients.chronic_conditions || EXCLUDED.chronic_conditions))), \
              primary_bin = COALESCE(EXCLUDED.primary_bin, patients.primary_bin), \
              primary_group = COALESCE(EXCLUDED.primary_group, patients.primary_group), \
              updated_at = now() \
              RETURNING patient_hash, id",
        );

        let resolved = builder
            .build_query_as::<PatientHashId>()
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("batch_upsert", "patient")?;

        Ok(resolved.into_iter().map(|r| (r.patient_hash, r.id)).collect())
    }

    async fn find_by_hash(&self, pharmacy_id: Uuid, patient_hash: &str) -> AppResult<Option<Patient>> {
        sqlx::query_as::<_, PatientRow>(PATIENT_FIND_BY_HASH)
            .bind(pharmacy_id)
            .bind(patient_hash)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "patient")
            .map(|row| row.map(Patient::from))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Patient>> {
        sqlx::query_as::<_, PatientRow>(PATIENT_FIND_BY_ID)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "patient")
            .map(|row| row.map(Patient::from))
    }
}
