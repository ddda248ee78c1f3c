//! Opportunity — a patient-level actionable row (§3).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::state_machine::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    NotSubmitted,
    Submitted,
    Approved,
    Completed,
    Denied,
    Declined,
    DidntWork,
    Flagged,
}

impl State for OpportunityStatus {}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::NotSubmitted => "Not Submitted",
            OpportunityStatus::Submitted => "Submitted",
            OpportunityStatus::Approved => "Approved",
            OpportunityStatus::Completed => "Completed",
            OpportunityStatus::Denied => "Denied",
            OpportunityStatus::Declined => "Declined",
            OpportunityStatus::DidntWork => "Didn't Work",
            OpportunityStatus::Flagged => "Flagged",
        }
    }

    /// §3 dedup key excludes live opportunities with these statuses.
    pub fn is_dead_for_dedup(&self) -> bool {
        matches!(self, OpportunityStatus::Denied | OpportunityStatus::Declined)
    }

    /// §3: once status has ever left `NotSubmitted` into one of these,
    /// deletion is permanently forbidden regardless of current status.
    pub fn is_protected_from_deletion(&self) -> bool {
        matches!(
            self,
            OpportunityStatus::Submitted
                | OpportunityStatus::Approved
                | OpportunityStatus::Completed
                | OpportunityStatus::Denied
        )
    }
}

impl std::fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OpportunityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Submitted" => Ok(Self::NotSubmitted),
            "Submitted" => Ok(Self::Submitted),
            "Approved" => Ok(Self::Approved),
            "Completed" => Ok(Self::Completed),
            "Denied" => Ok(Self::Denied),
            "Declined" => Ok(Self::Declined),
            "Didn't Work" => Ok(Self::DidntWork),
            "Flagged" => Ok(Self::Flagged),
            other => Err(format!("unknown opportunity status: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Opportunity {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub patient_id: Uuid,
    pub prescription_id: Uuid,
    pub trigger_id: Uuid,
    pub opportunity_type: String,

    pub current_drug_name: String,
    pub current_ndc: String,
    pub recommended_drug_name: String,
    pub recommended_ndc: Option<String>,

    pub avg_dispensed_qty: BigDecimal,
    pub potential_margin_gain: BigDecimal,
    pub annual_margin_gain: BigDecimal,
    pub clinical_rationale: Option<String>,

    pub status: OpportunityStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub actioned_at: Option<DateTime<Utc>>,
}

impl Opportunity {
    /// §3 dedup key for live opportunities.
    pub fn dedup_key(&self) -> (Uuid, Uuid, String) {
        (self.pharmacy_id, self.patient_id, self.recommended_drug_name.to_uppercase())
    }

    /// §3: `potential_margin_gain`, `annual_margin_gain`,
    /// `avg_dispensed_qty`, and `recommended_ndc` are mutable only while
    /// `status == NotSubmitted`.
    pub fn is_economics_mutable(&self) -> bool {
        self.status == OpportunityStatus::NotSubmitted
    }
}
