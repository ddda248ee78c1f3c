//! Prescription repository trait (§3, §4.1, §4.2, §4.3, §6 "prescriptions" table).

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::entities::Prescription;
use crate::shared::AppResult;

/// A row destined for the batch upsert in §4.1 step 2.
#[derive(Debug, Clone)]
pub struct PrescriptionUpsert {
    pub pharmacy_id: Uuid,
    pub patient_id: Uuid,
    pub rx_number: String,
    pub drug_name: String,
    pub ndc: String,
    pub quantity: BigDecimal,
    pub days_supply: Option<i32>,
    pub dispensed_date: NaiveDate,
    pub insurance_bin: String,
    pub insurance_group: Option<String>,
    pub contract_id: Option<String>,
    pub plan_name: Option<String>,
    pub patient_pay: BigDecimal,
    pub insurance_pay: BigDecimal,
    pub acquisition_cost: BigDecimal,
    pub prescriber_name: Option<String>,
    pub daw_code: Option<String>,
    pub raw: HashMap<String, String>,
}

#[async_trait]
pub trait PrescriptionRepository: Send + Sync {
    /// Batch-upsert keyed on `(pharmacy_id, rx_number, dispensed_date)`
    /// (§6); on conflict, updates drug_name, quantities, payments and raw
    /// bag (§4.1 step 2).
    async fn batch_upsert(&self, rows: &[PrescriptionUpsert]) -> AppResult<u64>;

    /// Every fill for `pharmacy_id` dispensed within `lookback_days`,
    /// joined to its patient (§4.2 "Inputs").
    async fn find_recent_for_pharmacy(
        &self,
        pharmacy_id: Uuid,
        lookback_days: i64,
    ) -> AppResult<Vec<Prescription>>;

    /// All fills for a single patient within the same window, used for
    /// `if_has_*`/`if_not_has_*` evaluation (§4.2 step 3).
    async fn find_recent_for_patient(
        &self,
        patient_id: Uuid,
        lookback_days: i64,
    ) -> AppResult<Vec<Prescription>>;

    /// Looks up the fill that produced an opportunity, so the coverage
    /// scanner's back-propagation step (§4.3 step 4) can resolve its
    /// BIN/group.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Prescription>>;

    /// Candidate claims for the coverage scanner (§4.3 "Candidate
    /// claims"): drug name matches one of `keyword_sets` (AND within a
    /// set, OR across sets), dispensed within `days_back`, BIN non-empty.
    /// Keyword/exclude filtering and the days-supply floor are applied by
    /// the caller against the returned rows because they require the
    /// per-row normalization math in §4.3, not a store-side computation.
    async fn find_candidates_for_scan(
        &self,
        drug_name_substrings: &[String],
        days_back: i64,
    ) -> AppResult<Vec<Prescription>>;

    /// One wide query across all recommended-drug keyword patterns in the
    /// last 365 days, feeding the evaluator's GP cache (§4.3 "GP cache
    /// used by §4.2 step 4(b)").
    async fn find_for_gp_cache(&self, drug_name_substrings: &[String]) -> AppResult<Vec<Prescription>>;
}
