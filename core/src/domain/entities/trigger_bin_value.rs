//! TriggerBinValue — derived per-`(trigger, bin, group)` economics (§3).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    Verified,
    Excluded,
    Unknown,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Verified => "verified",
            CoverageStatus::Excluded => "excluded",
            CoverageStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerBinValue {
    pub id: Uuid,
    pub trigger_id: Uuid,
    pub bin: String,
    /// `coalesce(group, '')` is folded into the unique key at the store
    /// layer; in memory we keep the optional group as-is.
    pub group: Option<String>,
    pub coverage_status: CoverageStatus,
    pub verified_claim_count: i64,
    pub avg_reimbursement: BigDecimal,
    pub avg_qty: BigDecimal,
    pub gp_value: BigDecimal,
    pub best_drug_name: Option<String>,
    pub best_ndc: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub is_excluded: bool,
}

impl TriggerBinValue {
    pub fn group_key(&self) -> &str {
        self.group.as_deref().unwrap_or("")
    }
}
