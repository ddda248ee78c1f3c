//! Prescription — a single dispensed fill, natural key
//! `(pharmacy_id, rx_number, dispensed_date)` (§3).

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Prescription {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub patient_id: Uuid,
    pub rx_number: String,
    pub drug_name: String,
    pub ndc: String,
    pub quantity: BigDecimal,
    pub days_supply: Option<i32>,
    pub dispensed_date: NaiveDate,
    pub insurance_bin: String,
    pub insurance_group: Option<String>,
    pub contract_id: Option<String>,
    pub plan_name: Option<String>,
    pub patient_pay: BigDecimal,
    pub insurance_pay: BigDecimal,
    pub acquisition_cost: BigDecimal,
    pub prescriber_name: Option<String>,
    pub daw_code: Option<String>,
    /// Source-specific key/value pairs not mapped to a canonical column,
    /// plus the canonical economics keys the coverage scanner consults in
    /// priority order (§4.3, §9): `gross_profit`, `net_profit`, `awp`,
    /// `therapeutic_class`, `plan_name`.
    pub raw: HashMap<String, String>,
}

impl Prescription {
    pub fn drug_name_upper(&self) -> String {
        self.drug_name.to_uppercase()
    }

    /// First non-zero value from `raw` across `keys`, normalized with
    /// `$`/`,` stripped. `None` if every key is absent or normalizes to
    /// zero.
    pub fn first_nonzero_raw(&self, keys: &[&str]) -> Option<BigDecimal> {
        for key in keys {
            if let Some(v) = self.raw.get(*key) {
                let amount = crate::shared::normalize::normalize_amount(v);
                if amount != BigDecimal::from(0) {
                    return Some(amount);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn base() -> Prescription {
        Prescription {
            id: Uuid::nil(),
            pharmacy_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            rx_number: "1001".to_string(),
            drug_name: "Lisinopril 10mg".to_string(),
            ndc: "00093010501".to_string(),
            quantity: BigDecimal::from(30),
            days_supply: Some(30),
            dispensed_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
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

    #[test]
    fn first_nonzero_raw_skips_zero_and_missing_keys() {
        let mut rx = base();
        rx.raw.insert("gross_profit".to_string(), "0".to_string());
        rx.raw.insert("net_profit".to_string(), "$12.50".to_string());
        let found = rx.first_nonzero_raw(&["gross_profit", "net_profit"]);
        assert_eq!(found, Some(BigDecimal::from_str("12.50").unwrap()));
    }

    #[test]
    fn first_nonzero_raw_none_when_all_absent() {
        let rx = base();
        assert_eq!(rx.first_nonzero_raw(&["gross_profit", "net_profit"]), None);
    }
}
