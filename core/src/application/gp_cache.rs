//! GP cache used by §4.2 step 4(b): recent fills of a trigger's
//! recommended drug, averaged at four levels of insurance specificity so
//! the evaluator can resolve a monthly GP even when no
//! `TriggerBinValue` row exists yet for a fill's exact (bin, group).

use bigdecimal::BigDecimal;
use std::collections::HashMap;

use crate::application::{economics, keywords};
use crate::domain::entities::{Prescription, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specificity {
    AllFour,
    ContractPlan,
    BinGroup,
    DrugOnly,
}

#[derive(Debug, Clone)]
pub struct GpCacheHit {
    pub gp: BigDecimal,
    pub specificity: Specificity,
}

struct Bucket {
    sum: BigDecimal,
    count: i64,
}

impl Bucket {
    fn mean(&self) -> BigDecimal {
        &self.sum / BigDecimal::from(self.count)
    }
}

/// Keyed by `drug_name_upper` plus whichever BIN/group/contract/plan
/// fields the specificity level consumes. Built once per scan from the
/// recommended-drug keyword patterns of all in-scope triggers (§4.3 "GP
/// cache").
pub struct GpCache {
    all_four: HashMap<String, Bucket>,
    contract_plan: HashMap<String, Bucket>,
    bin_group: HashMap<String, Bucket>,
    drug_only: HashMap<String, Bucket>,
}

impl GpCache {
    pub fn build(triggers: &[Trigger], prescriptions: &[Prescription]) -> Self {
        let mut cache = GpCache {
            all_four: HashMap::new(),
            contract_plan: HashMap::new(),
            bin_group: HashMap::new(),
            drug_only: HashMap::new(),
        };

        for trigger in triggers {
            let Some(drug) = &trigger.recommended_drug else { continue };
            let tokens = keywords::extract_keywords(drug);
            if tokens.is_empty() {
                continue;
            }
            let drug_upper = drug.to_uppercase();

            for rx in prescriptions {
                if !keywords::set_matches(&rx.drug_name_upper(), &tokens) {
                    continue;
                }
                let raw_gp = economics::claim_gp_from_raw(rx);
                let (gp30, _) = economics::normalize_to_30_day(&raw_gp, &rx.quantity, rx.days_supply, trigger.expected_days_supply);

                let bin = rx.insurance_bin.as_str();
                let group = rx.insurance_group.as_deref().unwrap_or("");
                let contract = rx.contract_id.as_deref().unwrap_or("");
                let plan = rx.plan_name.as_deref().unwrap_or("");

                accumulate(&mut cache.all_four, format!("{drug_upper}|{contract}|{plan}|{bin}|{group}"), &gp30);
                if !contract.is_empty() || !plan.is_empty() {
                    accumulate(&mut cache.contract_plan, format!("{drug_upper}|{contract}|{plan}"), &gp30);
                }
                accumulate(&mut cache.bin_group, format!("{drug_upper}|{bin}|{group}"), &gp30);
                accumulate(&mut cache.drug_only, drug_upper.clone(), &gp30);
            }
        }

        cache
    }

    /// Looks up the most specific non-empty bucket for a fill's insurance
    /// context, most-specific-first: all-four insurance fields, then
    /// contract+plan, then bin+group, then drug-only (§4.3).
    pub fn lookup(&self, drug_upper: &str, bin: &str, group: Option<&str>, contract_id: Option<&str>, plan_name: Option<&str>) -> Option<GpCacheHit> {
        let group = group.unwrap_or("");
        let contract = contract_id.unwrap_or("");
        let plan = plan_name.unwrap_or("");

        if let Some(bucket) = self.all_four.get(&format!("{drug_upper}|{contract}|{plan}|{bin}|{group}")) {
            return Some(GpCacheHit { gp: bucket.mean(), specificity: Specificity::AllFour });
        }
        if !contract.is_empty() || !plan.is_empty() {
            if let Some(bucket) = self.contract_plan.get(&format!("{drug_upper}|{contract}|{plan}")) {
                return Some(GpCacheHit { gp: bucket.mean(), specificity: Specificity::ContractPlan });
            }
        }
        if let Some(bucket) = self.bin_group.get(&format!("{drug_upper}|{bin}|{group}")) {
            return Some(GpCacheHit { gp: bucket.mean(), specificity: Specificity::BinGroup });
        }
        if let Some(bucket) = self.drug_only.get(drug_upper) {
            return Some(GpCacheHit { gp: bucket.mean(), specificity: Specificity::DrugOnly });
        }
        None
    }
}

fn accumulate(map: &mut HashMap<String, Bucket>, key: String, gp30: &BigDecimal) {
    let bucket = map.entry(key).or_insert_with(|| Bucket { sum: BigDecimal::from(0), count: 0 });
    bucket.sum += gp30;
    bucket.count += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PrescriptionFactory, TriggerFactory};
    use uuid::Uuid;

    #[test]
    fn lookup_prefers_all_four_over_looser_levels() {
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let trigger = TriggerFactory::build_with(|t| t.recommended_drug = Some("Losartan".to_string()));

        let specific = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| {
            rx.drug_name = "Losartan 50mg".to_string();
            rx.insurance_bin = "610097".to_string();
            rx.insurance_group = Some("GRP1".to_string());
            rx.contract_id = Some("C1".to_string());
            rx.plan_name = Some("PlanA".to_string());
            rx.raw.insert("gross_profit".to_string(), "30".to_string());
        });
        let loose = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| {
            rx.drug_name = "Losartan 50mg".to_string();
            rx.insurance_bin = "999999".to_string();
            rx.raw.insert("gross_profit".to_string(), "90".to_string());
        });

        let cache = GpCache::build(&[trigger], &[specific, loose]);

        let hit = cache
            .lookup("LOSARTAN", "610097", Some("GRP1"), Some("C1"), Some("PlanA"))
            .unwrap();
        assert_eq!(hit.specificity, Specificity::AllFour);
        assert_eq!(hit.gp, BigDecimal::from(30));

        let fallback = cache.lookup("LOSARTAN", "000000", None, None, None).unwrap();
        assert_eq!(fallback.specificity, Specificity::DrugOnly);
    }

    #[test]
    fn lookup_misses_when_no_fills_matched() {
        let trigger = TriggerFactory::build_with(|t| t.recommended_drug = Some("Rosuvastatin".to_string()));
        let cache = GpCache::build(&[trigger], &[]);
        assert!(cache.lookup("ROSUVASTATIN", "610097", None, None, None).is_none());
    }
}
