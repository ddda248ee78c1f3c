//! Trigger evaluation engine (§4.2): scans one pharmacy's recent fills
//! against its enabled triggers and creates opportunities.

use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::application::gp_cache::GpCache;
use crate::application::{economics, keywords};
use crate::domain::entities::{Opportunity, OpportunityStatus, Prescription, Trigger};
use crate::domain::repositories::{
    OpportunityRepository, PharmacyRepository, PrescriptionRepository, TriggerBinValueRepository, TriggerRepository,
};
use crate::shared::AppResult;

/// §4.2 step 4(e): last-resort monthly GP when no other signal resolves.
fn default_fallback_gp() -> BigDecimal {
    BigDecimal::from(50)
}

/// §4.2 step 5: a resolved monthly GP below this floor is not worth an
/// opportunity.
fn min_monthly_gp_threshold() -> BigDecimal {
    BigDecimal::from(10)
}

/// §7: per-kind error messages are capped to the first N (<=20).
const MAX_ERROR_SAMPLES: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct EvaluateSummary {
    pub created: i64,
    pub skipped_duplicates: i64,
    /// §7.4 invariant breaches, one per trigger skipped for that reason.
    pub invariant_breaches: Vec<String>,
}

pub struct TriggerEvaluator {
    trigger_repository: Arc<dyn TriggerRepository>,
    prescription_repository: Arc<dyn PrescriptionRepository>,
    pharmacy_repository: Arc<dyn PharmacyRepository>,
    opportunity_repository: Arc<dyn OpportunityRepository>,
    trigger_bin_value_repository: Arc<dyn TriggerBinValueRepository>,
}

impl TriggerEvaluator {
    pub fn new(
        trigger_repository: Arc<dyn TriggerRepository>,
        prescription_repository: Arc<dyn PrescriptionRepository>,
        pharmacy_repository: Arc<dyn PharmacyRepository>,
        opportunity_repository: Arc<dyn OpportunityRepository>,
        trigger_bin_value_repository: Arc<dyn TriggerBinValueRepository>,
    ) -> Self {
        Self {
            trigger_repository,
            prescription_repository,
            pharmacy_repository,
            opportunity_repository,
            trigger_bin_value_repository,
        }
    }

    /// `Evaluate(pharmacy_id, lookback_days) -> {created, skipped_duplicates}`
    /// (§4.2 public contract).
    pub async fn scan(&self, pharmacy_id: Uuid, lookback_days: i64) -> AppResult<EvaluateSummary> {
        let pharmacy = self.pharmacy_repository.find_by_id(pharmacy_id).await?;
        let excluded_bins: HashSet<String> = pharmacy.map(|p| p.excluded_bins().into_iter().collect()).unwrap_or_default();

        let triggers = self.trigger_repository.find_enabled_for_pharmacy(pharmacy_id).await?;
        let fills = self.prescription_repository.find_recent_for_pharmacy(pharmacy_id, lookback_days).await?;

        let mut by_patient: HashMap<Uuid, Vec<&Prescription>> = HashMap::new();
        for fill in &fills {
            by_patient.entry(fill.patient_id).or_default().push(fill);
        }

        let gp_patterns = gp_cache_patterns(&triggers);
        let gp_fills = if gp_patterns.is_empty() {
            Vec::new()
        } else {
            self.prescription_repository.find_for_gp_cache(&gp_patterns).await?
        };
        let gp_cache = GpCache::build(&triggers, &gp_fills);

        let mut summary = EvaluateSummary::default();
        let mut queued_this_scan: HashSet<(Uuid, Uuid)> = HashSet::new();

        for trigger in &triggers {
            // §7.4: a logic invariant breach is fatal to this trigger only;
            // other triggers continue.
            if let Err(e) = trigger.validate() {
                warn!(trigger_id = %trigger.id, trigger_code = %trigger.code, error = %e, "skipping trigger: invariant breach");
                if summary.invariant_breaches.len() < MAX_ERROR_SAMPLES {
                    summary.invariant_breaches.push(format!("trigger {}: {e}", trigger.id));
                }
                continue;
            }

            for (patient_id, patient_fills) in &by_patient {
                if queued_this_scan.contains(&(*patient_id, trigger.id)) {
                    continue;
                }

                let Some(detected) = find_detected_fill(trigger, patient_fills, &excluded_bins) else { continue };

                if !patient_context_satisfied(trigger, patient_fills, detected) {
                    continue;
                }

                let Some(recommended_drug) = &trigger.recommended_drug else { continue };
                let recommended_upper = recommended_drug.to_uppercase();

                if self
                    .opportunity_repository
                    .find_live_by_dedup_key(pharmacy_id, *patient_id, &recommended_upper)
                    .await?
                    .is_some()
                {
                    summary.skipped_duplicates += 1;
                    queued_this_scan.insert((*patient_id, trigger.id));
                    continue;
                }

                let tbv = self
                    .trigger_bin_value_repository
                    .find_match_including_excluded(trigger.id, &detected.insurance_bin, detected.insurance_group.as_deref())
                    .await?;
                if let Some(row) = &tbv {
                    if row.is_excluded {
                        continue;
                    }
                }

                let Some((monthly_gp, recommended_ndc, avg_qty)) = resolve_economics(trigger, detected, tbv.as_ref(), &gp_cache, &recommended_upper)
                else {
                    continue;
                };

                if monthly_gp < min_monthly_gp_threshold() {
                    continue;
                }

                let opportunity = Opportunity {
                    id: Uuid::new_v4(),
                    pharmacy_id,
                    patient_id: *patient_id,
                    prescription_id: detected.id,
                    trigger_id: trigger.id,
                    opportunity_type: trigger.trigger_type.as_str().to_string(),
                    current_drug_name: detected.drug_name.clone(),
                    current_ndc: detected.ndc.clone(),
                    recommended_drug_name: recommended_drug.clone(),
                    recommended_ndc,
                    avg_dispensed_qty: avg_qty,
                    potential_margin_gain: economics::round_cents(&monthly_gp),
                    annual_margin_gain: economics::round_cents(&(&monthly_gp * BigDecimal::from(trigger.annual_fills))),
                    clinical_rationale: trigger.clinical_rationale.clone().or_else(|| trigger.action_instructions.clone()),
                    status: OpportunityStatus::NotSubmitted,
                    created_at: Utc::now(),
                    reviewed_at: None,
                    actioned_at: None,
                };

                self.opportunity_repository.create(opportunity).await?;
                summary.created += 1;
                queued_this_scan.insert((*patient_id, trigger.id));
            }
        }

        Ok(summary)
    }
}

/// Recommended-drug keyword patterns across every trigger, used to build
/// the one wide GP-cache query (§4.3).
fn gp_cache_patterns(triggers: &[Trigger]) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut seen = HashSet::new();
    for trigger in triggers {
        let Some(drug) = &trigger.recommended_drug else { continue };
        for token in keywords::extract_keywords(drug) {
            if seen.insert(token.clone()) {
                patterns.push(token);
            }
        }
    }
    patterns
}

/// §4.2 step 3: most recent fill (patient_fills is DESC by dispensed_date)
/// whose drug name contains a detection keyword and none of the exclude
/// keywords, in scope for this trigger's pharmacy/BIN/group/contract
/// restrictions.
fn find_detected_fill<'a>(trigger: &Trigger, patient_fills: &[&'a Prescription], excluded_bins: &HashSet<String>) -> Option<&'a Prescription> {
    patient_fills.iter().copied().find(|fill| {
        let drug_upper = fill.drug_name_upper();

        let detects = trigger.detection_keywords.iter().any(|kw| drug_upper.contains(kw.as_str()));
        if !detects {
            return false;
        }
        if trigger.exclude_keywords.iter().any(|kw| drug_upper.contains(kw.as_str())) {
            return false;
        }

        if excluded_bins.contains(&fill.insurance_bin) {
            return false;
        }
        if !trigger.bin_inclusions.is_empty() && !trigger.bin_inclusions.contains(&fill.insurance_bin) {
            return false;
        }
        if trigger.bin_exclusions.contains(&fill.insurance_bin) {
            return false;
        }

        let group = fill.insurance_group.as_deref().unwrap_or("");
        if !trigger.group_inclusions.is_empty() && !trigger.group_inclusions.contains(group) {
            return false;
        }
        if trigger.group_exclusions.contains(group) {
            return false;
        }

        if let Some(contract) = &fill.contract_id {
            if trigger.contract_prefix_exclusions.iter().any(|prefix| contract.starts_with(prefix.as_str())) {
                return false;
            }
        }

        true
    })
}

/// §4.2 step 3 "patient context": `if_has_keywords`/`if_not_has_keywords`
/// evaluated against the patient's other fills (every fill but the
/// detected one), honoring `keyword_match_mode` for `if_has_keywords`.
fn patient_context_satisfied(trigger: &Trigger, patient_fills: &[&Prescription], detected: &Prescription) -> bool {
    let other_names: Vec<String> = patient_fills
        .iter()
        .filter(|f| f.id != detected.id)
        .map(|f| f.drug_name_upper())
        .collect();

    if !trigger.if_has_keywords.is_empty() {
        use crate::domain::entities::KeywordMatchMode;
        let satisfied = match trigger.keyword_match_mode {
            KeywordMatchMode::Any => trigger
                .if_has_keywords
                .iter()
                .any(|kw| other_names.iter().any(|name| name.contains(kw.as_str()))),
            KeywordMatchMode::All => trigger
                .if_has_keywords
                .iter()
                .all(|kw| other_names.iter().any(|name| name.contains(kw.as_str()))),
        };
        if !satisfied {
            return false;
        }
    }

    if trigger
        .if_not_has_keywords
        .iter()
        .any(|kw| other_names.iter().any(|name| name.contains(kw.as_str())))
    {
        return false;
    }

    true
}

/// §4.2 step 4: resolves `(monthly_gp, recommended_ndc, avg_dispensed_qty)`
/// in priority order (a) verified `TriggerBinValue` (b) GP cache (c)
/// trigger default (d) per-claim raw-bag GP (e) flat fallback.
fn resolve_economics(
    trigger: &Trigger,
    detected: &Prescription,
    tbv: Option<&crate::domain::entities::TriggerBinValue>,
    gp_cache: &GpCache,
    recommended_upper: &str,
) -> Option<(BigDecimal, Option<String>, BigDecimal)> {
    if let Some(row) = tbv {
        return Some((
            row.gp_value.clone(),
            row.best_ndc.clone().or_else(|| trigger.recommended_ndc.clone()),
            if row.avg_qty > BigDecimal::from(0) { row.avg_qty.clone() } else { detected.quantity.clone() },
        ));
    }

    if let Some(hit) = gp_cache.lookup(
        recommended_upper,
        &detected.insurance_bin,
        detected.insurance_group.as_deref(),
        detected.contract_id.as_deref(),
        detected.plan_name.as_deref(),
    ) {
        return Some((hit.gp, trigger.recommended_ndc.clone(), detected.quantity.clone()));
    }

    if trigger.default_gp_value > BigDecimal::from(0) {
        return Some((trigger.default_gp_value.clone(), trigger.recommended_ndc.clone(), detected.quantity.clone()));
    }

    let raw_gp = economics::claim_gp_from_raw(detected);
    if raw_gp > BigDecimal::from(0) {
        let (gp30, qty30) = economics::normalize_to_30_day(&raw_gp, &detected.quantity, detected.days_supply, trigger.expected_days_supply);
        return Some((gp30, trigger.recommended_ndc.clone(), qty30));
    }

    Some((default_fallback_gp(), trigger.recommended_ndc.clone(), detected.quantity.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PrescriptionFactory, TriggerFactory};

    #[test]
    fn find_detected_fill_respects_exclude_keywords() {
        let trigger = TriggerFactory::build_with(|t| {
            t.detection_keywords = HashSet::from(["LISINOPRIL".to_string()]);
            t.exclude_keywords = HashSet::from(["HCTZ".to_string()]);
        });
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let plain = PrescriptionFactory::build(pharmacy_id, patient_id);
        let combo = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| rx.drug_name = "Lisinopril HCTZ 10-12.5mg".to_string());

        let fills = vec![&combo, &plain];
        let detected = find_detected_fill(&trigger, &fills, &HashSet::new());
        assert_eq!(detected.unwrap().id, plain.id);
    }

    #[test]
    fn find_detected_fill_honors_excluded_bins() {
        let trigger = TriggerFactory::build();
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let fill = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| rx.insurance_bin = "014798".to_string());
        let excluded = HashSet::from(["014798".to_string()]);
        assert!(find_detected_fill(&trigger, &[&fill], &excluded).is_none());
    }

    #[test]
    fn patient_context_if_has_any_vs_all() {
        use crate::domain::entities::KeywordMatchMode;
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let detected = PrescriptionFactory::build(pharmacy_id, patient_id);
        let other = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| rx.drug_name = "Metformin 500mg".to_string());

        let trigger_any = TriggerFactory::build_with(|t| {
            t.if_has_keywords = HashSet::from(["METFORMIN".to_string(), "INSULIN".to_string()]);
            t.keyword_match_mode = KeywordMatchMode::Any;
        });
        assert!(patient_context_satisfied(&trigger_any, &[&detected, &other], &detected));

        let trigger_all = TriggerFactory::build_with(|t| {
            t.if_has_keywords = HashSet::from(["METFORMIN".to_string(), "INSULIN".to_string()]);
            t.keyword_match_mode = KeywordMatchMode::All;
        });
        assert!(!patient_context_satisfied(&trigger_all, &[&detected, &other], &detected));
    }

    #[test]
    fn patient_context_if_not_has_blocks() {
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let detected = PrescriptionFactory::build(pharmacy_id, patient_id);
        let other = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| rx.drug_name = "Warfarin 5mg".to_string());

        let trigger = TriggerFactory::build_with(|t| t.if_not_has_keywords = HashSet::from(["WARFARIN".to_string()]));
        assert!(!patient_context_satisfied(&trigger, &[&detected, &other], &detected));
    }

    #[test]
    fn resolve_economics_falls_back_through_priority_chain() {
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let detected = PrescriptionFactory::build_with(pharmacy_id, patient_id, |rx| {
            rx.raw.insert("gross_profit".to_string(), "20".to_string());
        });

        let mut trigger = TriggerFactory::build();
        trigger.default_gp_value = BigDecimal::from(0);
        let empty_cache = GpCache::build(&[], &[]);

        let (gp, _, _) = resolve_economics(&trigger, &detected, None, &empty_cache, "LOSARTAN").unwrap();
        assert_eq!(gp, BigDecimal::from(20));
    }

    #[test]
    fn resolve_economics_uses_flat_fallback_when_nothing_else_resolves() {
        let pharmacy_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let detected = PrescriptionFactory::build(pharmacy_id, patient_id);

        let mut trigger = TriggerFactory::build();
        trigger.default_gp_value = BigDecimal::from(0);
        let empty_cache = GpCache::build(&[], &[]);

        let (gp, _, _) = resolve_economics(&trigger, &detected, None, &empty_cache, "LOSARTAN").unwrap();
        assert_eq!(gp, default_fallback_gp());
    }
}
