//! Postgres-backed `PrescriptionRepository` (§3, §4.1, §4.2, §4.3, §6
//! "prescriptions" table).

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Prescription;
use crate::domain::repositories::{PrescriptionRepository, PrescriptionUpsert};
use crate::infrastructure::database::queries::prescriptions::{
    PRESCRIPTION_FIND_BY_ID, PRESCRIPTION_FIND_CANDIDATES_FOR_SCAN, PRESCRIPTION_FIND_FOR_GP_CACHE,
    PRESCRIPTION_FIND_RECENT_FOR_PATIENT, PRESCRIPTION_FIND_RECENT_FOR_PHARMACY,
};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

#[derive(Debug, FromRow)]
struct PrescriptionRow {
    id: Uuid,
    pharmacy_id: Uuid,
    patient_id: Uuid,
    rx_number: String,
    drug_name: String,
    ndc: String,
    quantity: BigDecimal,
    days_supply: Option<i32>,
    dispensed_date: NaiveDate,
    insurance_bin: String,
    insurance_group: Option<String>,
    contract_id: Option<String>,
    plan_name: Option<String>,
    patient_pay: BigDecimal,
    insurance_pay: BigDecimal,
    acquisition_cost: BigDecimal,
    prescriber_name: Option<String>,
    daw_code: Option<String>,
    raw: serde_json::Value,
}

fn raw_to_map(value: serde_json::Value) -> HashMap<String, String> {
    match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Null => None,
                other => Some((k, other.to_string())),
            })
            .collect(),
        _ => HashMap::new(),
    }
}

fn map_to_raw(map: &HashMap<String, String>) -> serde_json::Value {
    serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone()))).collect())
}

impl From<PrescriptionRow> for Prescription {
    fn from(row: PrescriptionRow) -> Self {
        Prescription {
            id: row.id,
            pharmacy_id: row.pharmacy_id,
            patient_id: row.patient_id,
            rx_number: row.rx_number,
            drug_name: row.drug_name,
            ndc: row.ndc,
            quantity: row.quantity,
            days_supply: row.days_supply,
            dispensed_date: row.dispensed_date,
            insurance_bin: row.insurance_bin,
            insurance_group: row.insurance_group,
            contract_id: row.contract_id,
            plan_name: row.plan_name,
            patient_pay: row.patient_pay,
            insurance_pay: row.insurance_pay,
            acquisition_cost: row.acquisition_cost,
            prescriber_name: row.prescriber_name,
            daw_code: row.daw_code,
            raw: raw_to_map(row.raw),
        }
    }
}

pub struct PrescriptionRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl PrescriptionRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl PrescriptionRepository for PrescriptionRepositoryImpl {
    /// §4.1 step 2: one multi-row `INSERT ... ON CONFLICT` per batch,
    /// keyed on `(pharmacy_id, rx_number, dispensed_date)`; on conflict,
    /// updates drug_name, quantities, payments and the raw bag.
    async fn batch_upsert(&self, rows: &[PrescriptionUpsert]) -> AppResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder = sqlx::QueryBuilder::new(
            "INSERT INTO prescriptions (id, pharmacy_id, patient_id, rx_number, drug_name, ndc, \
             quantity, days_supply, dispensed_date, insurance_bin, insurance_group, contract_id, \
             plan_name, patient_pay, insurance_pay, acquisition_cost, prescriber_name, daw_code, \
             raw, created_at, updated_at) ",
        );

        builder.push_values(rows, |mut b, row| {
            b.push_bind(Uuid::new_v4())
                .push_bind(row.pharmacy_id)
                .push_bind(row.patient_id)
                .push_bind(&row.rx_number)
                .push_bind(&row.drug_name)
                .push_bind(&row.ndc)
                .push_bind(row.quantity.clone())
                .push_bind(row.days_supply)
                .push_bind(row.dispensed_date)
                .push_bind(&row.insurance_bin)
                .push_bind(&row.insurance_group)
                .push_bind(&row.contract_id)
                .push_bind(&row.plan_name)
                .push_bind(row.patient_pay.clone())
                .push_bind(row.insurance_pay.clone())
                .push_bind(row.acquisition_cost.clone())
                .push_bind(&row.prescriber_name)
                .push_bind(&row.daw_code)
                .push_bind(map_to_raw(&row.raw))
                .push("now()")
                .push("now()");
        });

        builder.push(
            " ON CONFLICT (pharmacy_id, rx_number, dispensed_date) DO UPDATE SET \
              drug_name = EXCLUDED.drug_name, \
              ndc = EXCLUDED.ndc, \
              quantity = EXCLUDED.quantity, \
              days_supply = EXCLUDED.days_supply, \
              insurance_bin = EXCLUDED.insurance_bin, \
              insurance_group = EXCLUDED.insurance_group, \
              contract_id = EXCLUDED.contract_id, \
              plan_name = EXCLUDED.plan_name, \
              patient_pay = EXCLUDED.patient_pay, \
              insurance_pay = EXCLUDED.insurance_pay, \
              acquisition_cost = EXCLUDED.acquisition_cost, \
              prescriber_name = EXCLUDED.prescriber_name, \
              daw_code = EXCLUDED.daw_code, \
              raw = EXCLUDED.raw, \
              updated_at = now()",
        );

        let result = builder
            .build()
            .execute(self.database_service.pool())
            .await
            .map_db_error("batch_upsert", "prescription")?;

        Ok(result.rows_affected())
    }

    async fn find_recent_for_pharmacy(&self, pharmacy_id: Uuid, lookback_days: i64) -> AppResult<Vec<Prescription>> {
        let since = (Utc::now() - chrono::Duration::days(lookback_days)).date_naive();
        sqlx::query_as::<_, PrescriptionRow>(PRESCRIPTION_FIND_RECENT_FOR_PHARMACY)
            .bind(pharmacy_id)
            .bind(since)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "prescription")
            .map(|rows| rows.into_iter().map(Prescription::from).collect())
    }

    async fn find_recent_for_patient(&self, patient_id: Uuid, lookback_days: i64) -> AppResult<Vec<Prescription>> {
        let since = (Utc::now() - chrono::Duration::days(lookback_days)).date_naive();
        sqlx::query_as::<_, PrescriptionRow>(PRESCRIPTION_FIND_RECENT_FOR_PATIENT)
            .bind(patient_id)
            .bind(since)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "prescription")
            .map(|rows| rows.into_iter().map(Prescription::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Prescription>> {
        sqlx::query_as::<_, PrescriptionRow>(PRESCRIPTION_FIND_BY_ID)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "prescription")
            .map(|row| row.map(Prescription::from))
    }

    async fn find_candidates_for_scan(&self, drug_name_substrings: &[String], days_back: i64) -> AppResult<Vec<Prescription>> {
        let since = (Utc::now() - chrono::Duration::days(days_back)).date_naive();
        let patterns: Vec<String> = drug_name_substrings.iter().map(|s| format!("%{}%", s.to_uppercase())).collect();
        sqlx::query_as::<_, PrescriptionRow>(PRESCRIPTION_FIND_CANDIDATES_FOR_SCAN)
            .bind(since)
            .bind(&patterns)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "prescription")
            .map(|rows| rows.into_iter().map(Prescription::from).collect())
    }

    async fn find_for_gp_cache(&self, drug_name_substrings: &[String]) -> AppResult<Vec<Prescription>> {
        let since = (Utc::now() - chrono::Duration::days(365)).date_naive();
        let patterns: Vec<String> = drug_name_substrings.iter().map(|s| format!("%{}%", s.to_uppercase())).collect();
        sqlx::query_as::<_, PrescriptionRow>(PRESCRIPTION_FIND_FOR_GP_CACHE)
            .bind(since)
            .bind(&patterns)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "prescription")
            .map(|rows| rows.into_iter().map(Prescription::from).collect())
    }
}
