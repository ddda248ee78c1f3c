//! Trigger — a detection rule (§3).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::shared::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    TherapeuticInterchange,
    MissingTherapy,
    NdcOptimization,
    /// Treated as a synonym of `TherapeuticInterchange` per §9 Open
    /// Questions — the upstream switch statement never branched on it
    /// distinctly.
    Combo,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::TherapeuticInterchange => "therapeutic_interchange",
            TriggerType::MissingTherapy => "missing_therapy",
            TriggerType::NdcOptimization => "ndc_optimization",
            TriggerType::Combo => "combo",
        }
    }

    pub fn is_ndc_optimization(&self) -> bool {
        matches!(self, TriggerType::NdcOptimization)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatchMode {
    Any,
    All,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: Uuid,
    pub code: String,
    pub display_name: String,
    pub trigger_type: TriggerType,
    pub category: String,
    pub enabled: bool,
    pub priority: i32,

    pub detection_keywords: HashSet<String>,
    pub exclude_keywords: HashSet<String>,
    pub if_has_keywords: HashSet<String>,
    pub if_not_has_keywords: HashSet<String>,
    pub keyword_match_mode: KeywordMatchMode,
    pub expected_qty: Option<BigDecimal>,
    pub expected_days_supply: Option<i32>,

    pub recommended_drug: Option<String>,
    pub recommended_ndc: Option<String>,
    pub pharmacy_inclusions: HashSet<Uuid>,
    pub bin_inclusions: HashSet<String>,
    pub bin_exclusions: HashSet<String>,
    pub group_inclusions: HashSet<String>,
    pub group_exclusions: HashSet<String>,
    pub contract_prefix_exclusions: Vec<String>,

    pub annual_fills: i32,
    pub default_gp_value: BigDecimal,
    pub min_margin_default: BigDecimal,
    pub clinical_rationale: Option<String>,
    pub action_instructions: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl Trigger {
    /// §3 invariant: detection and exclude keyword sets are disjoint.
    /// §7.4: an enabled trigger with zero detection keywords (and no
    /// recommended-drug-derived keywords for NDC-optimization triggers) is
    /// a logic invariant breach, fatal to the scan of that trigger only.
    pub fn validate(&self) -> AppResult<()> {
        if !self.detection_keywords.is_disjoint(&self.exclude_keywords) {
            return Err(AppError::InvariantBreach(format!(
                "trigger {} has overlapping detection/exclude keywords",
                self.code
            )));
        }
        if self.enabled && self.detection_keywords.is_empty() && !self.trigger_type.is_ndc_optimization() {
            return Err(AppError::InvariantBreach(format!(
                "trigger {} is enabled with zero detection keywords",
                self.code
            )));
        }
        Ok(())
    }

    pub fn in_scope_for_pharmacy(&self, pharmacy_id: Uuid) -> bool {
        self.pharmacy_inclusions.is_empty() || self.pharmacy_inclusions.contains(&pharmacy_id)
    }

    /// Priority mapped to a coarse bucket for opportunity display: 1-2
    /// high, 3-4 medium, else low (§4.2 Output).
    pub fn priority_bucket(&self) -> &'static str {
        match self.priority {
            1 | 2 => "high",
            3 | 4 => "medium",
            _ => "low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn base_trigger() -> Trigger {
        Trigger {
            id: Uuid::nil(),
            code: "T1".to_string(),
            display_name: "Test".to_string(),
            trigger_type: TriggerType::TherapeuticInterchange,
            category: "cardio".to_string(),
            enabled: true,
            priority: 1,
            detection_keywords: HashSet::from(["LISINOPRIL".to_string()]),
            exclude_keywords: HashSet::new(),
            if_has_keywords: HashSet::new(),
            if_not_has_keywords: HashSet::new(),
            keyword_match_mode: KeywordMatchMode::Any,
            expected_qty: None,
            expected_days_supply: None,
            recommended_drug: Some("Losartan 50mg".to_string()),
            recommended_ndc: None,
            pharmacy_inclusions: HashSet::new(),
            bin_inclusions: HashSet::new(),
            bin_exclusions: HashSet::new(),
            group_inclusions: HashSet::new(),
            group_exclusions: HashSet::new(),
            contract_prefix_exclusions: Vec::new(),
            annual_fills: 12,
            default_gp_value: BigDecimal::from(15),
            min_margin_default: BigDecimal::from(10),
            clinical_rationale: None,
            action_instructions: None,
            synced_at: None,
        }
    }

    #[test]
    fn validate_rejects_overlapping_keywords() {
        let mut t = base_trigger();
        t.exclude_keywords.insert("LISINOPRIL".to_string());
        assert!(t.validate().is_err());
    }

    #[test]
    fn validate_rejects_enabled_with_no_keywords() {
        let mut t = base_trigger();
        t.detection_keywords.clear();
        assert!(t.validate().is_err());
    }

    #[test]
    fn ndc_optimization_exempt_from_detection_keyword_requirement() {
        let mut t = base_trigger();
        t.trigger_type = TriggerType::NdcOptimization;
        t.detection_keywords.clear();
        assert!(t.validate().is_ok());
    }

    #[test]
    fn priority_buckets() {
        let mut t = base_trigger();
        t.priority = 1;
        assert_eq!(t.priority_bucket(), "high");
        t.priority = 4;
        assert_eq!(t.priority_bucket(), "medium");
        t.priority = 9;
        assert_eq!(t.priority_bucket(), "low");
    }
}
