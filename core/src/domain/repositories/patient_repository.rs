//! Patient repository trait (§3, §4.1 two-phase load, §6 "patients" table).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Patient;
use crate::shared::AppResult;

/// A row destined for the batch upsert in §4.1 step 2 — `id` is absent
/// until the store assigns or resolves one.
#[derive(Debug, Clone)]
pub struct PatientUpsert {
    pub pharmacy_id: Uuid,
    pub patient_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub chronic_conditions: std::collections::BTreeSet<String>,
    pub primary_bin: Option<String>,
    pub primary_group: Option<String>,
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Batch-upsert on unique `(pharmacy_id, patient_hash)` (§6); merges
    /// `chronic_conditions` into the existing set rather than replacing it.
    /// Returns the resolved `(patient_hash, id)` pairs so the ingestor can
    /// rewrite prescription rows with real patient ids (§4.1 step 2).
    async fn batch_upsert(&self, rows: &[PatientUpsert]) -> AppResult<Vec<(String, Uuid)>>;

    async fn find_by_hash(&self, pharmacy_id: Uuid, patient_hash: &str) -> AppResult<Option<Patient>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Patient>>;
}
