//! OpportunityAuditLog repository trait (§3 "Append-only record").

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::OpportunityAuditLogEntry;
use crate::shared::AppResult;

#[async_trait]
pub trait OpportunityAuditLogRepository: Send + Sync {
    async fn append(&self, entry: OpportunityAuditLogEntry) -> AppResult<OpportunityAuditLogEntry>;

    async fn find_for_opportunity(&self, opportunity_id: Uuid) -> AppResult<Vec<OpportunityAuditLogEntry>>;

    /// §3 "MUST NOT be deleted": true once any entry's `to_status` is one
    /// of {Submitted, Approved, Completed, Denied}.
    async fn has_left_not_submitted(&self, opportunity_id: Uuid) -> AppResult<bool>;
}
