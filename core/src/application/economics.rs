//! Per-30-day GP/quantity normalization shared by the evaluator's GP
//! cache (§4.3 "GP cache used by §4.2 step 4(b)") and the coverage
//! scanner's aggregation step (§4.3 "GP normalization per claim").

use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::domain::entities::Prescription;
use crate::shared::normalize::{normalize_amount, GP_RAW_BAG_KEYS};

/// §4.3 "GP normalization per claim": first non-zero raw-bag signal in
/// `GP_RAW_BAG_KEYS` order, else `Price - Actual Cost` computed from the
/// raw bag. Deliberately does not fall back to
/// `insurance_pay + patient_pay - acquisition_cost` — the scanner and the
/// evaluator's GP cache trust only raw-bag signals, per §4.3.
pub fn claim_gp_from_raw(rx: &Prescription) -> BigDecimal {
    if let Some(gp) = rx.first_nonzero_raw(GP_RAW_BAG_KEYS) {
        return gp;
    }
    let price = rx
        .raw
        .get("Price")
        .or_else(|| rx.raw.get("price"))
        .map(|v| normalize_amount(v))
        .unwrap_or_else(|| BigDecimal::from(0));
    let actual_cost = rx
        .raw
        .get("Actual Cost")
        .or_else(|| rx.raw.get("actual_cost"))
        .map(|v| normalize_amount(v))
        .unwrap_or_else(|| BigDecimal::from(0));
    price - actual_cost
}

/// §4.3: `days_supply` when present, else `90` if qty > 60, else `60` if
/// qty > 34, else `30`.
pub fn days_supply_est(days_supply: Option<i32>, qty: &BigDecimal) -> i32 {
    if let Some(ds) = days_supply {
        if ds > 0 {
            return ds;
        }
    }
    let sixty = BigDecimal::from(60);
    let thirty_four = BigDecimal::from(34);
    if *qty > sixty {
        90
    } else if *qty > thirty_four {
        60
    } else {
        30
    }
}

/// Normalizes a claim's raw GP and quantity to a 30-day basis (§4.3).
///
/// When `expected_days_supply` is set, scales exactly by `30 /
/// max(days_supply_est, 1)`; otherwise divides by the number of 30-day
/// buckets in `days_supply_est` (`ceil(days_supply_est / 30)`, floor 1).
pub fn normalize_to_30_day(
    gp: &BigDecimal,
    qty: &BigDecimal,
    days_supply: Option<i32>,
    expected_days_supply: Option<i32>,
) -> (BigDecimal, BigDecimal) {
    let estimated = days_supply_est(days_supply, qty).max(1);

    if expected_days_supply.is_some() {
        let multiplier = BigDecimal::from(30) / BigDecimal::from(estimated);
        return (gp * &multiplier, qty * &multiplier);
    }

    let buckets = ((estimated as f64) / 30.0).ceil().max(1.0) as i64;
    let divisor = BigDecimal::from(buckets);
    (gp / &divisor, qty / &divisor)
}

/// §4.3 meets-threshold floor for candidate claims: `days_supply >= 28`,
/// or `>= 0.8 * expected_days_supply` when that field is set on the
/// trigger.
pub fn meets_days_supply_floor(days_supply: Option<i32>, expected_days_supply: Option<i32>) -> bool {
    let Some(ds) = days_supply else { return false };
    match expected_days_supply {
        Some(expected) if expected > 0 => (ds as f64) >= 0.8 * (expected as f64),
        _ => ds >= 28,
    }
}

/// Round a monetary `BigDecimal` to cents, half away from zero.
pub fn round_cents(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, bigdecimal::RoundingMode::HalfUp)
}

/// Median of a set of per-(bin,group) mean GPs (§4.3 step 3). Empty
/// input yields zero.
pub fn median(values: &[BigDecimal]) -> BigDecimal {
    if values.is_empty() {
        return BigDecimal::from_str("0").unwrap();
    }
    let mut sorted: Vec<BigDecimal> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid].clone()
    } else {
        (&sorted[mid - 1] + &sorted[mid]) / BigDecimal::from(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_supply_est_prefers_explicit_value() {
        assert_eq!(days_supply_est(Some(45), &BigDecimal::from(30)), 45);
    }

    #[test]
    fn days_supply_est_falls_back_on_quantity() {
        assert_eq!(days_supply_est(None, &BigDecimal::from(90)), 90);
        assert_eq!(days_supply_est(None, &BigDecimal::from(40)), 60);
        assert_eq!(days_supply_est(None, &BigDecimal::from(10)), 30);
    }

    #[test]
    fn normalize_bucketed_90_day_claim() {
        let gp = BigDecimal::from(90);
        let qty = BigDecimal::from(90);
        let (gp30, _) = normalize_to_30_day(&gp, &qty, Some(90), None);
        assert_eq!(gp30, BigDecimal::from(30));
    }

    #[test]
    fn normalize_exact_scaling_when_expected_days_supply_set() {
        let gp = BigDecimal::from(60);
        let qty = BigDecimal::from(60);
        let (gp30, _) = normalize_to_30_day(&gp, &qty, Some(60), Some(60));
        assert_eq!(gp30, BigDecimal::from(30));
    }

    #[test]
    fn days_supply_floor_uses_expected_when_set() {
        assert!(meets_days_supply_floor(Some(24), Some(28)));
        assert!(!meets_days_supply_floor(Some(20), Some(28)));
        assert!(meets_days_supply_floor(Some(28), None));
        assert!(!meets_days_supply_floor(Some(27), None));
    }

    #[test]
    fn claim_gp_prefers_raw_bag_signal_over_price_minus_cost() {
        let mut rx = crate::testing::PrescriptionFactory::build(uuid::Uuid::nil(), uuid::Uuid::nil());
        rx.raw.insert("gross_profit".to_string(), "$12.50".to_string());
        rx.raw.insert("Price".to_string(), "999".to_string());
        rx.raw.insert("Actual Cost".to_string(), "1".to_string());
        assert_eq!(claim_gp_from_raw(&rx), BigDecimal::from_str("12.50").unwrap());
    }

    #[test]
    fn claim_gp_falls_back_to_price_minus_actual_cost() {
        let mut rx = crate::testing::PrescriptionFactory::build(uuid::Uuid::nil(), uuid::Uuid::nil());
        rx.raw.insert("Price".to_string(), "$40.00".to_string());
        rx.raw.insert("Actual Cost".to_string(), "$25.00".to_string());
        assert_eq!(claim_gp_from_raw(&rx), BigDecimal::from_str("15.00").unwrap());
    }

    #[test]
    fn median_of_odd_and_even_sets() {
        let odd = vec![BigDecimal::from(10), BigDecimal::from(30), BigDecimal::from(20)];
        assert_eq!(median(&odd), BigDecimal::from(20));
        let even = vec![BigDecimal::from(10), BigDecimal::from(20), BigDecimal::from(30), BigDecimal::from(40)];
        assert_eq!(median(&even), BigDecimal::from(25));
    }
}
