//! Patient — one per unique `(pharmacy, patient_hash)` (§3).

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Patient {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub patient_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub chronic_conditions: BTreeSet<String>,
    pub primary_bin: Option<String>,
    pub primary_group: Option<String>,
}

/// Stable digest of normalized `(last, first)` + DOB, or `"rx:<rx_number>"`
/// when no name is available (§3, §9). Two real patients sharing
/// `(last, first, DOB)` will collide by design — no fuzzy merge is
/// attempted.
pub fn patient_hash(last: &str, first: &str, dob: Option<NaiveDate>, rx_number: Option<&str>) -> String {
    let last_norm = last.trim().to_lowercase();
    let first_norm = first.trim().to_lowercase();

    if last_norm.is_empty() && first_norm.is_empty() {
        let rx = rx_number.unwrap_or("");
        return format!("rx:{rx}");
    }

    let dob_str = dob.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let input = format!("{last_norm}, {first_norm}|{dob_str}");
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_seed_scenario() {
        let hash = patient_hash("Doe", "Jane", NaiveDate::from_ymd_opt(1960, 1, 15), None);
        let mut expected_hasher = Sha256::new();
        expected_hasher.update(b"doe, jane|1960-01-15");
        let expected = hex::encode(expected_hasher.finalize());
        assert_eq!(hash, expected);
    }

    #[test]
    fn hash_degrades_to_rx_number_without_name() {
        let hash = patient_hash("", "", None, Some("1001"));
        assert_eq!(hash, "rx:1001");
    }

    #[test]
    fn hash_is_case_and_whitespace_insensitive() {
        let a = patient_hash("Doe", "Jane", NaiveDate::from_ymd_opt(1960, 1, 15), None);
        let b = patient_hash(" DOE ", " jane ", NaiveDate::from_ymd_opt(1960, 1, 15), None);
        assert_eq!(a, b);
    }
}
