//! Coverage scanner (§4.3): the process-wide job that verifies which
//! (trigger, bin, group) combinations actually carry margin, writes
//! `TriggerBinValue` rows, and back-propagates updated economics onto
//! not-yet-submitted opportunities.

use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::application::{economics, keywords};
use crate::domain::entities::{CoverageStatus, Prescription, Trigger, TriggerBinValue};
use crate::domain::repositories::{OpportunityRepository, PrescriptionRepository, TriggerBinValueRepository, TriggerRepository};
use crate::shared::AppResult;

/// §7: per-kind error messages are capped to the first N (<=20).
const MAX_ERROR_SAMPLES: usize = 20;

#[derive(Debug, Clone)]
pub struct CoverageScanParams {
    pub min_claims: i64,
    pub days_back: i64,
    pub min_margin: BigDecimal,
    pub dme_min_margin: BigDecimal,
}

impl Default for CoverageScanParams {
    fn default() -> Self {
        Self {
            min_claims: 1,
            days_back: 365,
            min_margin: BigDecimal::from(10),
            dme_min_margin: BigDecimal::from(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerCoverageResult {
    pub trigger_id: Uuid,
    pub trigger_code: String,
    pub verified_rows: i64,
    pub disabled: bool,
    pub cleaned_up_opportunities: u64,
}

#[derive(Debug, Clone)]
pub struct NoMatchEntry {
    pub trigger_id: Uuid,
    pub trigger_code: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct CoverageScanSummary {
    pub triggers_scanned: i64,
    pub total_verified_rows: i64,
    pub opportunities_backpropagated: i64,
    pub opportunities_cleaned_up: i64,
    /// §7.4 invariant breaches, one per trigger skipped for that reason.
    pub invariant_breaches: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanAllCoverageResult {
    pub summary: CoverageScanSummary,
    pub per_trigger_results: Vec<TriggerCoverageResult>,
    pub no_match_list: Vec<NoMatchEntry>,
}

pub struct CoverageScanner {
    trigger_repository: Arc<dyn TriggerRepository>,
    prescription_repository: Arc<dyn PrescriptionRepository>,
    trigger_bin_value_repository: Arc<dyn TriggerBinValueRepository>,
    opportunity_repository: Arc<dyn OpportunityRepository>,
}

impl CoverageScanner {
    pub fn new(
        trigger_repository: Arc<dyn TriggerRepository>,
        prescription_repository: Arc<dyn PrescriptionRepository>,
        trigger_bin_value_repository: Arc<dyn TriggerBinValueRepository>,
        opportunity_repository: Arc<dyn OpportunityRepository>,
    ) -> Self {
        Self {
            trigger_repository,
            prescription_repository,
            trigger_bin_value_repository,
            opportunity_repository,
        }
    }

    /// `ScanAllCoverage(params) -> {per_trigger_results, no_match_list,
    /// summary}` (§4.3 public contract).
    pub async fn scan_all_coverage(&self, params: CoverageScanParams) -> AppResult<ScanAllCoverageResult> {
        let triggers = self.trigger_repository.find_all_enabled().await?;

        let mut result = ScanAllCoverageResult::default();
        result.summary.triggers_scanned = triggers.len() as i64;

        for trigger in &triggers {
            // §7.4: a logic invariant breach is fatal to this trigger only;
            // other triggers continue.
            if let Err(e) = trigger.validate() {
                warn!(trigger_id = %trigger.id, trigger_code = %trigger.code, error = %e, "skipping trigger: invariant breach");
                if result.summary.invariant_breaches.len() < MAX_ERROR_SAMPLES {
                    result.summary.invariant_breaches.push(format!("trigger {}: {e}", trigger.id));
                }
                continue;
            }

            let Some(sets) = keyword_sets_for(trigger) else {
                result.no_match_list.push(NoMatchEntry {
                    trigger_id: trigger.id,
                    trigger_code: trigger.code.clone(),
                    reason: "no search criteria".to_string(),
                });
                result.summary.opportunities_cleaned_up += self.cleanup_out_of_scope(trigger).await? as i64;
                continue;
            };
            if sets.iter().all(|set| set.is_empty()) {
                result.no_match_list.push(NoMatchEntry {
                    trigger_id: trigger.id,
                    trigger_code: trigger.code.clone(),
                    reason: "no valid search terms after filtering".to_string(),
                });
                result.summary.opportunities_cleaned_up += self.cleanup_out_of_scope(trigger).await? as i64;
                continue;
            }

            let candidates = self.candidate_claims(trigger, &sets, params.days_back).await?;

            let threshold = if trigger.trigger_type.is_ndc_optimization() { &params.dme_min_margin } else { &params.min_margin };
            let groups = aggregate(&candidates, params.min_claims, threshold);

            if groups.is_empty() {
                result.no_match_list.push(NoMatchEntry {
                    trigger_id: trigger.id,
                    trigger_code: trigger.code.clone(),
                    reason: format!("no claims found with margin >= ${threshold}"),
                });
                self.trigger_repository.disable(trigger.id).await?;
                let cleaned_up = self.cleanup_out_of_scope(trigger).await?;
                result.summary.opportunities_cleaned_up += cleaned_up as i64;
                result.per_trigger_results.push(TriggerCoverageResult {
                    trigger_id: trigger.id,
                    trigger_code: trigger.code.clone(),
                    verified_rows: 0,
                    disabled: true,
                    cleaned_up_opportunities: cleaned_up,
                });
                continue;
            }

            let rows: Vec<TriggerBinValue> = groups
                .iter()
                .map(|g| TriggerBinValue {
                    id: Uuid::new_v4(),
                    trigger_id: trigger.id,
                    bin: g.bin.clone(),
                    group: g.group.clone(),
                    coverage_status: CoverageStatus::Verified,
                    verified_claim_count: g.count,
                    avg_reimbursement: economics::round_cents(&(&g.reimbursement_sum / BigDecimal::from(g.count))),
                    avg_qty: &g.qty_sum / BigDecimal::from(g.count),
                    gp_value: economics::round_cents(&g.mean_gp()),
                    best_drug_name: Some(g.sample_drug_name.clone()),
                    best_ndc: Some(g.ndc.clone()),
                    verified_at: Some(Utc::now()),
                    is_excluded: false,
                })
                .collect();

            self.trigger_bin_value_repository.replace_verified_for_trigger(trigger.id, &rows).await?;

            let means: Vec<BigDecimal> = groups.iter().map(|g| g.mean_gp()).collect();
            let median = economics::median(&means);
            self.trigger_repository.update_default_gp_value(trigger.id, median.clone(), Utc::now()).await?;

            let backpropagated = self.back_propagate(trigger, &median).await?;
            result.summary.opportunities_backpropagated += backpropagated;

            let cleaned_up = self.cleanup_out_of_scope(trigger).await?;
            result.summary.opportunities_cleaned_up += cleaned_up as i64;

            result.summary.total_verified_rows += rows.len() as i64;
            result.per_trigger_results.push(TriggerCoverageResult {
                trigger_id: trigger.id,
                trigger_code: trigger.code.clone(),
                verified_rows: rows.len() as i64,
                disabled: false,
                cleaned_up_opportunities: cleaned_up,
            });
        }

        Ok(result)
    }

    async fn candidate_claims(&self, trigger: &Trigger, sets: &[Vec<String>], days_back: i64) -> AppResult<Vec<Prescription>> {
        let patterns: Vec<String> = sets.iter().flatten().cloned().collect();
        let rows = self.prescription_repository.find_candidates_for_scan(&patterns, days_back).await?;

        Ok(rows
            .into_iter()
            .filter(|rx| {
                let drug_upper = rx.drug_name_upper();
                if !keywords::any_set_matches(&drug_upper, sets) {
                    return false;
                }
                if trigger.exclude_keywords.iter().any(|kw| drug_upper.contains(kw.as_str())) {
                    return false;
                }
                if rx.insurance_bin.is_empty() {
                    return false;
                }
                economics::meets_days_supply_floor(rx.days_supply, trigger.expected_days_supply)
            })
            .collect())
    }

    async fn back_propagate(&self, trigger: &Trigger, fallback_median: &BigDecimal) -> AppResult<i64> {
        let opportunities = self.opportunity_repository.find_not_submitted_for_trigger(trigger.id).await?;
        let mut updated = 0i64;

        for opp in opportunities {
            let Some(fill) = self.prescription_repository.find_by_id(opp.prescription_id).await? else { continue };

            let tbv = self
                .trigger_bin_value_repository
                .find_match(trigger.id, &fill.insurance_bin, fill.insurance_group.as_deref())
                .await?;

            let (gp, qty, ndc) = match &tbv {
                Some(row) => (
                    row.gp_value.clone(),
                    if row.avg_qty > BigDecimal::from(0) { row.avg_qty.clone() } else { opp.avg_dispensed_qty.clone() },
                    row.best_ndc.clone().or_else(|| opp.recommended_ndc.clone()),
                ),
                None => (fallback_median.clone(), opp.avg_dispensed_qty.clone(), opp.recommended_ndc.clone()),
            };

            let potential = economics::round_cents(&gp);
            let annual = economics::round_cents(&(&gp * BigDecimal::from(trigger.annual_fills)));

            self.opportunity_repository
                .update_economics(opp.id, potential, annual, qty, ndc)
                .await?;
            updated += 1;
        }

        Ok(updated)
    }

    /// §4.3 step 6 "Pharmacy-scope cleanup": runs for every scoped trigger
    /// regardless of whether this scan produced any verified rows, since a
    /// trigger can be narrowed to a smaller `pharmacy_inclusions` set
    /// without ever changing its coverage.
    async fn cleanup_out_of_scope(&self, trigger: &Trigger) -> AppResult<u64> {
        if trigger.pharmacy_inclusions.is_empty() {
            return Ok(0);
        }
        let keep: Vec<Uuid> = trigger.pharmacy_inclusions.iter().copied().collect();
        self.opportunity_repository.delete_not_submitted_outside_pharmacies(trigger.id, &keep).await
    }
}

/// §4.3 "Keyword extraction": NDC-optimization triggers search each
/// `detection_keywords` token as its own OR'd set; other trigger types
/// AND the tokens extracted from `recommended_drug` as a single set.
/// `None` when the trigger has no search criteria at all.
fn keyword_sets_for(trigger: &Trigger) -> Option<Vec<Vec<String>>> {
    if trigger.trigger_type.is_ndc_optimization() {
        if trigger.detection_keywords.is_empty() {
            return None;
        }
        Some(
            trigger
                .detection_keywords
                .iter()
                .map(|kw| keywords::extract_keywords(kw))
                .collect(),
        )
    } else {
        let drug = trigger.recommended_drug.as_ref()?;
        Some(vec![keywords::extract_keywords(drug)])
    }
}

struct CandidateGroup {
    bin: String,
    group: Option<String>,
    sample_drug_name: String,
    ndc: String,
    count: i64,
    gp_sum: BigDecimal,
    reimbursement_sum: BigDecimal,
    qty_sum: BigDecimal,
}

impl CandidateGroup {
    fn mean_gp(&self) -> BigDecimal {
        &self.gp_sum / BigDecimal::from(self.count)
    }
}

/// §4.3 "Aggregation": groups candidates by `(bin, group, drug_name,
/// ndc)`, filters by count/margin threshold, then keeps only the
/// highest-mean-GP group per `(bin, group)` — the store's unique key on
/// `TriggerBinValue` allows only one row per pair regardless of trigger
/// type.
fn aggregate(candidates: &[Prescription], min_claims: i64, min_margin: &BigDecimal) -> Vec<CandidateGroup> {
    let mut groups: HashMap<(String, String, String, String), CandidateGroup> = HashMap::new();

    for rx in candidates {
        let group_key = rx.insurance_group.clone().unwrap_or_default();
        let key = (rx.insurance_bin.clone(), group_key.clone(), rx.drug_name_upper(), rx.ndc.clone());

        let raw_gp = economics::claim_gp_from_raw(rx);
        let (gp30, qty30) = economics::normalize_to_30_day(&raw_gp, &rx.quantity, rx.days_supply, None);
        let (reimbursement30, _) = economics::normalize_to_30_day(&rx.insurance_pay, &rx.quantity, rx.days_supply, None);

        let entry = groups.entry(key).or_insert_with(|| CandidateGroup {
            bin: rx.insurance_bin.clone(),
            group: rx.insurance_group.clone(),
            sample_drug_name: rx.drug_name.clone(),
            ndc: rx.ndc.clone(),
            count: 0,
            gp_sum: BigDecimal::from(0),
            reimbursement_sum: BigDecimal::from(0),
            qty_sum: BigDecimal::from(0),
        });
        entry.count += 1;
        entry.gp_sum += &gp30;
        entry.reimbursement_sum += &reimbursement30;
        entry.qty_sum += &qty30;
    }

    let surviving: Vec<CandidateGroup> = groups
        .into_values()
        .filter(|g| g.count >= min_claims && g.mean_gp() >= *min_margin)
        .collect();

    let mut best_per_bin_group: HashMap<(String, String), CandidateGroup> = HashMap::new();
    for group in surviving {
        let key = (group.bin.clone(), group.group.clone().unwrap_or_default());
        match best_per_bin_group.get(&key) {
            Some(existing) if existing.mean_gp() >= group.mean_gp() => {}
            _ => {
                best_per_bin_group.insert(key, group);
            }
        }
    }

    best_per_bin_group.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PrescriptionFactory, TriggerFactory};
    use crate::domain::entities::TriggerType;
    use std::collections::HashSet;
    use uuid::Uuid;

    #[test]
    fn keyword_sets_for_ndc_optimization_splits_per_token() {
        let trigger = TriggerFactory::build_with(|t| {
            t.trigger_type = TriggerType::NdcOptimization;
            t.detection_keywords = HashSet::from(["Albuterol HFA".to_string(), "Ipratropium".to_string()]);
        });
        let sets = keyword_sets_for(&trigger).unwrap();
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn keyword_sets_for_non_ndc_is_single_anded_set() {
        let trigger = TriggerFactory::build_with(|t| t.recommended_drug = Some("Amlodipine Benazepril".to_string()));
        let sets = keyword_sets_for(&trigger).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].len(), 2);
    }

    #[test]
    fn keyword_sets_for_none_without_search_criteria() {
        let trigger = TriggerFactory::build_with(|t| {
            t.trigger_type = TriggerType::NdcOptimization;
            t.detection_keywords.clear();
        });
        assert!(keyword_sets_for(&trigger).is_none());
    }

    #[test]
    fn aggregate_keeps_highest_mean_gp_group_per_bin_and_group() {
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();

        let low = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| {
            rx.drug_name = "Losartan 50mg".to_string();
            rx.ndc = "11111111111".to_string();
            rx.raw.insert("gross_profit".to_string(), "15".to_string());
        });
        let high = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| {
            rx.drug_name = "Losartan Potassium 50mg".to_string();
            rx.ndc = "22222222222".to_string();
            rx.raw.insert("gross_profit".to_string(), "45".to_string());
        });

        let groups = aggregate(&[low, high], 1, &BigDecimal::from(10));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ndc, "22222222222");
    }

    #[test]
    fn aggregate_drops_groups_below_claim_count_or_margin_floor() {
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let thin = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| {
            rx.raw.insert("gross_profit".to_string(), "2".to_string());
        });
        let groups = aggregate(&[thin], 1, &BigDecimal::from(10));
        assert!(groups.is_empty());
    }
}
