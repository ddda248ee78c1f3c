//! Opportunity repository trait (§3, §4.2, §4.3, §5, §8).

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::entities::Opportunity;
use crate::shared::AppResult;

#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    async fn create(&self, opportunity: Opportunity) -> AppResult<Opportunity>;

    /// Dedup check (§4.2 step 6, §8 uniqueness law): is there a live
    /// opportunity — status not in {Denied, Declined} — for this triple?
    async fn find_live_by_dedup_key(
        &self,
        pharmacy_id: Uuid,
        patient_id: Uuid,
        recommended_drug_name_upper: &str,
    ) -> AppResult<Option<Opportunity>>;

    /// All "Not Submitted" opportunities created from `trigger_id`, for
    /// back-propagation (§4.3 step 4).
    async fn find_not_submitted_for_trigger(&self, trigger_id: Uuid) -> AppResult<Vec<Opportunity>>;

    /// §4.3 step 4: economics fields only, while `status = Not
    /// Submitted` — callers must not call this once status has left that
    /// state (§3 "frozen once status leaves Not Submitted").
    async fn update_economics(
        &self,
        opportunity_id: Uuid,
        potential_margin_gain: BigDecimal,
        annual_margin_gain: BigDecimal,
        avg_dispensed_qty: BigDecimal,
        recommended_ndc: Option<String>,
    ) -> AppResult<()>;

    /// §4.3 step 6: delete "Not Submitted" opportunities for `trigger_id`
    /// whose `pharmacy_id` is outside `pharmacy_inclusions`. The store
    /// enforces (§3, §5) that opportunities which ever left "Not
    /// Submitted" cannot be deleted, so this never touches those rows.
    async fn delete_not_submitted_outside_pharmacies(
        &self,
        trigger_id: Uuid,
        keep_pharmacy_ids: &[Uuid],
    ) -> AppResult<u64>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Opportunity>>;

    /// Applies a status transition and returns the updated row. Callers
    /// must have already produced the target status via
    /// `domain::state_machine::opportunity` and persist the resulting
    /// audit entry separately through `OpportunityAuditLogRepository`.
    async fn update_status(
        &self,
        opportunity_id: Uuid,
        new_status: crate::domain::entities::OpportunityStatus,
        reviewed_at: Option<chrono::DateTime<chrono::Utc>>,
        actioned_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> AppResult<Opportunity>;

    /// Rejected by the store (§3, §5, §8) if the opportunity's audit log
    /// contains a transition out of "Not Submitted".
    async fn delete(&self, opportunity_id: Uuid) -> AppResult<()>;
}
