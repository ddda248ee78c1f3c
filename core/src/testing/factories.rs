//! Test data factories, mirroring the teacher's `UserFactory` /
//! `OrganizationFactory` pattern (`build()` with realistic defaults,
//! `build_with(|x| ...)` for overrides).

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

use crate::domain::entities::{
    KeywordMatchMode, Opportunity, OpportunityStatus, Patient, Pharmacy, Prescription, Trigger, TriggerType,
};

pub struct PharmacyFactory;

impl PharmacyFactory {
    pub fn build() -> Pharmacy {
        Pharmacy {
            id: Uuid::new_v4(),
            name: "Test Pharmacy".to_string(),
            settings: HashMap::new(),
        }
    }

    pub fn build_with<F: FnOnce(&mut Pharmacy)>(modifier: F) -> Pharmacy {
        let mut pharmacy = Self::build();
        modifier(&mut pharmacy);
        pharmacy
    }

    pub fn build_with_excluded_bins(bins: &[&str]) -> Pharmacy {
        Self::build_with(|p| {
            p.settings.insert("excluded_bins".to_string(), serde_json::json!(bins));
        })
    }
}

pub struct PatientFactory;

impl PatientFactory {
    pub fn build(pharmacy_id: Uuid) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            pharmacy_id,
            patient_hash: format!("hash-{}", Uuid::new_v4()),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1960, 1, 15),
            chronic_conditions: BTreeSet::new(),
            primary_bin: Some("610097".to_string()),
            primary_group: None,
        }
    }
}

pub struct PrescriptionFactory;

impl PrescriptionFactory {
    pub fn build(pharmacy_id: Uuid, patient_id: Uuid) -> Prescription {
        Prescription {
            id: Uuid::new_v4(),
            pharmacy_id,
            patient_id,
            rx_number: format!("{}", rand_like()),
            drug_name: "Lisinopril 10mg".to_string(),
            ndc: "00093010501".to_string(),
            quantity: BigDecimal::from(30),
            days_supply: Some(30),
            dispensed_date: Utc::now().date_naive(),
            insurance_bin: "610097".to_string(),
            insurance_group: None,
            contract_id: None,
            plan_name: None,
            patient_pay: BigDecimal::from(0),
            insurance_pay: BigDecimal::from(0),
            acquisition_cost: BigDecimal::from(0),
            prescriber_name: None,
            daw_code: None,
            raw: HashMap::new(),
        }
    }

    pub fn build_with<F: FnOnce(&mut Prescription)>(pharmacy_id: Uuid, patient_id: Uuid, modifier: F) -> Prescription {
        let mut rx = Self::build(pharmacy_id, patient_id);
        modifier(&mut rx);
        rx
    }

    pub fn with_gross_profit(pharmacy_id: Uuid, patient_id: Uuid, gross_profit: &str) -> Prescription {
        Self::build_with(pharmacy_id, patient_id, |rx| {
            rx.raw.insert("gross_profit".to_string(), gross_profit.to_string());
        })
    }
}

/// Deterministic per-call counter so factory-built rows get distinct
/// natural keys without pulling in a `rand` dependency just for tests.
fn rand_like() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1000);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

pub struct TriggerFactory;

impl TriggerFactory {
    pub fn build() -> Trigger {
        Trigger {
            id: Uuid::new_v4(),
            code: "T1".to_string(),
            display_name: "Lisinopril to Losartan".to_string(),
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
            clinical_rationale: Some("Lower-cost ARB alternative".to_string()),
            action_instructions: None,
            synced_at: None,
        }
    }

    pub fn build_with<F: FnOnce(&mut Trigger)>(modifier: F) -> Trigger {
        let mut trigger = Self::build();
        modifier(&mut trigger);
        trigger
    }
}

pub struct OpportunityFactory;

impl OpportunityFactory {
    pub fn build(pharmacy_id: Uuid, patient_id: Uuid, prescription_id: Uuid, trigger_id: Uuid) -> Opportunity {
        Opportunity {
            id: Uuid::new_v4(),
            pharmacy_id,
            patient_id,
            prescription_id,
            trigger_id,
            opportunity_type: "therapeutic_interchange".to_string(),
            current_drug_name: "Lisinopril 10mg".to_string(),
            current_ndc: "00093010501".to_string(),
            recommended_drug_name: "Losartan 50mg".to_string(),
            recommended_ndc: None,
            avg_dispensed_qty: BigDecimal::from(30),
            potential_margin_gain: BigDecimal::from(15),
            annual_margin_gain: BigDecimal::from(180),
            clinical_rationale: None,
            status: OpportunityStatus::NotSubmitted,
            created_at: Utc::now(),
            reviewed_at: None,
            actioned_at: None,
        }
    }

    pub fn build_with<F: FnOnce(&mut Opportunity)>(
        pharmacy_id: Uuid,
        patient_id: Uuid,
        prescription_id: Uuid,
        trigger_id: Uuid,
        modifier: F,
    ) -> Opportunity {
        let mut opp = Self::build(pharmacy_id, patient_id, prescription_id, trigger_id);
        modifier(&mut opp);
        opp
    }
}
