//! Claims-export header alias table (§4.1 "Header normalization").
//!
//! An ordered list constant, not scattered conditionals, per §9 —
//! covering the vendor column names the spec names at minimum
//! (PioneerRx, RX30, PrimeRx, Aracoma/PMS) plus the generic forms seen
//! across exports. Aliases are matched case-insensitively with extra
//! whitespace collapsed; unmapped columns survive into the prescription's
//! raw bag under their original header text.

pub const RX_NUMBER: &str = "rx_number";
pub const DRUG_NAME: &str = "drug_name";
pub const NDC: &str = "ndc";
pub const QUANTITY: &str = "quantity";
pub const DAYS_SUPPLY: &str = "days_supply";
pub const DISPENSED_DATE: &str = "dispensed_date";
pub const PATIENT_NAME: &str = "patient_name";
pub const PATIENT_FIRST_NAME: &str = "patient_first_name";
pub const PATIENT_LAST_NAME: &str = "patient_last_name";
pub const PATIENT_DOB: &str = "patient_dob";
pub const INSURANCE_BIN: &str = "insurance_bin";
pub const GROUP_NUMBER: &str = "group_number";
pub const CONTRACT_ID: &str = "contract_id";
pub const PLAN_NAME: &str = "plan_name";
pub const PATIENT_PAY: &str = "patient_pay";
pub const INSURANCE_PAY: &str = "insurance_pay";
pub const ACQUISITION_COST: &str = "acquisition_cost";
pub const GROSS_PROFIT: &str = "gross_profit";
pub const NET_PROFIT: &str = "net_profit";
pub const AWP: &str = "awp";
pub const PRESCRIBER_NAME: &str = "prescriber_name";
pub const DAW_CODE: &str = "daw_code";
pub const SIG: &str = "sig";
pub const THERAPEUTIC_CLASS: &str = "therapeutic_class";

/// `(canonical_field, known_header_aliases)`, each alias already
/// lowercased with single-spaced whitespace.
pub const HEADER_ALIASES: &[(&str, &[&str])] = &[
    (
        RX_NUMBER,
        &["rx number", "rx #", "rx_number", "rxno", "prescription number", "script number", "rx num"],
    ),
    (
        DRUG_NAME,
        &[
            "drug name",
            "dispensed item name",
            "drug description",
            "ndc description",
            "medication name",
            "item name",
            "product name",
        ],
    ),
    (NDC, &["ndc", "dispensed item ndc", "ndc number", "ndc code", "ndc11", "ndc 11"]),
    (QUANTITY, &["quantity", "dispensed quantity", "qty dispensed", "qty", "quantity dispensed"]),
    (DAYS_SUPPLY, &["days supply", "day supply", "dayssup", "days_supply", "day's supply"]),
    (
        DISPENSED_DATE,
        &["dispensed date", "date written", "fill date", "date filled", "rx date", "date of service"],
    ),
    (
        PATIENT_NAME,
        &[
            "patient name",
            "patient full name last then first",
            "patient full name",
            "patient",
            "patient full name first then last",
        ],
    ),
    (PATIENT_FIRST_NAME, &["patient first name", "first name", "patient fname"]),
    (PATIENT_LAST_NAME, &["patient last name", "last name", "patient lname"]),
    (PATIENT_DOB, &["patient dob", "patient date of birth", "date of birth", "dob"]),
    (INSURANCE_BIN, &["bin", "primary third party bin", "insurance bin", "rx bin", "bin number", "bin/pcn"]),
    (GROUP_NUMBER, &["group", "group number", "group id", "rx group", "grp"]),
    (CONTRACT_ID, &["contract", "contract id", "contract number", "contract_id"]),
    (PLAN_NAME, &["plan name", "plan"]),
    (PATIENT_PAY, &["patient pay", "copay", "patient responsibility", "patient paid"]),
    (INSURANCE_PAY, &["insurance pay", "ins pay", "third party payment", "ins paid"]),
    (ACQUISITION_COST, &["acquisition cost", "actual cost", "cost", "acq cost", "avg acquisition cost"]),
    (GROSS_PROFIT, &["gross profit", "gp"]),
    (NET_PROFIT, &["net profit", "np"]),
    (AWP, &["awp", "average wholesale price"]),
    (PRESCRIBER_NAME, &["prescriber", "prescriber name", "doctor name", "physician name", "md name"]),
    (DAW_CODE, &["daw", "daw code", "dispense as written"]),
    (SIG, &["sig", "directions", "sig codes", "directions for use"]),
    (THERAPEUTIC_CLASS, &["therapeutic class", "drug class", "class", "ahfs class"]),
];

/// Case-insensitive, whitespace-collapsed header normalization, applied
/// before matching against `HEADER_ALIASES`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a raw header cell to a canonical field name, if known.
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let normalized = normalize_header(header);
    HEADER_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| *a == normalized))
        .map(|(canonical, _)| *canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_aliases_case_insensitively() {
        assert_eq!(canonical_field("Primary Third Party Bin"), Some(INSURANCE_BIN));
        assert_eq!(canonical_field("  Dispensed   Item Name "), Some(DRUG_NAME));
        assert_eq!(canonical_field("Date Written"), Some(DISPENSED_DATE));
    }

    #[test]
    fn unmapped_header_returns_none() {
        assert_eq!(canonical_field("Some Vendor Specific Column"), None);
    }
}
