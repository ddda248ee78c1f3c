//! OpportunityAuditLog — append-only record of every status change (§3).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::opportunity::OpportunityStatus;

#[derive(Debug, Clone)]
pub struct OpportunityAuditLogEntry {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    pub from_status: OpportunityStatus,
    pub to_status: OpportunityStatus,
    pub actor: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}
