//! Name/date/amount normalization shared by the ingestor, evaluator, and
//! coverage scanner (§4.1, §4.3, §9 "ordered list constant, not scattered
//! conditionals").

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use super::error::AppError;
use super::result::AppResult;

/// Parse a claims-export date string into a `NaiveDate`. Accepts
/// `MM/DD/YYYY`, `M/D/YYYY`, `M-D-YYYY`, with an optional trailing time.
pub fn normalize_date(raw: &str) -> AppResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Malformed("empty date".to_string()));
    }
    // Strip a trailing time component ourselves so we don't need a format
    // string per delimiter x per time-precision combination.
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    for fmt in &["%m/%d/%Y", "%m-%d-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Ok(d);
        }
    }
    // chrono's %m/%d/%Y requires zero-padding on some platforms' strptime;
    // fall back to a manual split for single-digit month/day.
    for sep in ['/', '-'] {
        let parts: Vec<&str> = date_part.split(sep).collect();
        if parts.len() == 3 {
            if let (Ok(m), Ok(d), Ok(y)) = (
                parts[0].parse::<u32>(),
                parts[1].parse::<u32>(),
                parts[2].parse::<i32>(),
            ) {
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                    return Ok(date);
                }
            }
        }
    }
    Err(AppError::Malformed(format!("unrecognized date: {raw}")))
}

/// Strip `$` and `,`; empty/NaN collapses to zero, per §4.1.
pub fn normalize_amount(raw: &str) -> BigDecimal {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return BigDecimal::from(0);
    }
    BigDecimal::from_str(&cleaned).unwrap_or_else(|_| BigDecimal::from(0))
}

/// Strip non-digits, left-pad to 6 characters.
pub fn normalize_bin(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 6 {
        digits
    } else {
        format!("{:0>6}", digits)
    }
}

/// Strip hyphens from an NDC. Returns `(ndc, was_valid_length)` — the
/// caller flags `!was_valid_length` into the prescription's raw bag rather
/// than rejecting the row, per §4.1.
pub fn normalize_ndc(raw: &str) -> (String, bool) {
    let stripped: String = raw.chars().filter(|c| *c != '-').collect();
    let valid = stripped.len() == 11;
    (stripped, valid)
}

/// Honorifics stripped from patient names before first/last parsing.
const HONORIFICS: &[&str] = &["JR", "JR.", "SR", "SR.", "II", "III", "IV", "V"];

/// Parse a free-text patient name into `(first, last)`. Handles
/// `"Last, First Middle"` and `"First Middle Last"` forms; strips
/// parenthesized suffixes (e.g. `"(BP)"`) and honorifics first (§4.1).
pub fn parse_patient_name(raw: &str) -> (String, String) {
    let no_parens = strip_parenthesized(raw);
    let tokens: Vec<&str> = no_parens
        .split_whitespace()
        .filter(|t| !is_honorific(t))
        .collect();

    if let Some(comma_idx) = no_parens.find(',') {
        let (last_part, first_part) = no_parens.split_at(comma_idx);
        let first_part = &first_part[1..]; // drop the comma
        let last = strip_honorifics_str(last_part).trim().to_string();
        let first = strip_honorifics_str(first_part).trim().to_string();
        let first = first.split_whitespace().next().unwrap_or("").to_string();
        return (first, last);
    }

    match tokens.len() {
        0 => (String::new(), String::new()),
        1 => (tokens[0].to_string(), String::new()),
        _ => (
            tokens[0].to_string(),
            tokens[tokens.len() - 1].to_string(),
        ),
    }
}

fn is_honorific(token: &str) -> bool {
    HONORIFICS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(token.trim_matches(',')))
}

fn strip_honorifics_str(s: &str) -> String {
    s.split_whitespace()
        .filter(|t| !is_honorific(t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_parenthesized(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0i32;
    for c in raw.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = (depth - 1).max(0),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Therapeutic-class substring → chronic-condition table (GLOSSARY).
/// An ordered list constant, not scattered conditionals, per §9.
pub const THERAPEUTIC_CLASS_CONDITIONS: &[(&[&str], &str)] = &[
    (&["DIABETES", "INSULIN", "BIGUANIDE", "SULFONYLUREA"], "Diabetes"),
    (
        &["ACE INHIBITOR", "ARB", "ANTIHYPERTENSIVE", "BETA BLOCKER", "CALCIUM CHANNEL"],
        "Hypertension",
    ),
    (&["STATIN", "CHOLESTEROL", "LIPID"], "Hyperlipidemia"),
    (&["ANTIDEPRESSANT", "SSRI", "SNRI"], "Depression"),
    (&["BRONCHODILATOR", "COPD", "ASTHMA"], "COPD/Asthma"),
    (&["ANTICOAGULANT", "BLOOD THINNER"], "CVD"),
    (&["THYROID"], "Thyroid"),
    (&["PROTON PUMP", "PPI", "GERD"], "GERD"),
    (&["HIV"], "HIV"),
];

/// Infer chronic conditions from a therapeutic-class string.
pub fn conditions_for_therapeutic_class(class: &str) -> Vec<&'static str> {
    let upper = class.to_uppercase();
    THERAPEUTIC_CLASS_CONDITIONS
        .iter()
        .filter(|(needles, _)| needles.iter().any(|n| upper.contains(n)))
        .map(|(_, condition)| *condition)
        .collect()
}

/// Ordered raw-bag keys tried, first non-zero wins, when resolving a
/// claim's gross profit (§4.3). A constant, not scattered conditionals.
pub const GP_RAW_BAG_KEYS: &[&str] = &[
    "gross_profit",
    "Gross Profit",
    "grossprofit",
    "GrossProfit",
    "net_profit",
    "Net Profit",
    "netprofit",
    "NetProfit",
    "adj_profit",
    "adjprofit",
    "AdjProfit",
    "Adjusted Profit",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_formats() {
        assert_eq!(
            normalize_date("01/02/2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
        assert_eq!(
            normalize_date("1/2/2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
        assert_eq!(
            normalize_date("1-2-2025 10:15").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
    }

    #[test]
    fn amount_strips_currency_formatting() {
        assert_eq!(normalize_amount("$1,234.56"), BigDecimal::from_str("1234.56").unwrap());
        assert_eq!(normalize_amount(""), BigDecimal::from(0));
        assert_eq!(normalize_amount("NaN"), BigDecimal::from(0));
    }

    #[test]
    fn bin_padding() {
        assert_eq!(normalize_bin("4740"), "004740");
        assert_eq!(normalize_bin("610097"), "610097");
    }

    #[test]
    fn ndc_flags_bad_length() {
        let (ndc, valid) = normalize_ndc("0009-3010-501");
        assert_eq!(ndc, "00093010501");
        assert!(valid);
        let (_, valid) = normalize_ndc("123");
        assert!(!valid);
    }

    #[test]
    fn name_last_comma_first() {
        let (first, last) = parse_patient_name("Doe, Jane");
        assert_eq!(first, "Jane");
        assert_eq!(last, "Doe");
    }

    #[test]
    fn name_first_last_with_honorific() {
        let (first, last) = parse_patient_name("John Smith Jr");
        assert_eq!(first, "John");
        assert_eq!(last, "Smith");
    }

    #[test]
    fn name_strips_parenthesized_suffix() {
        let (first, last) = parse_patient_name("Jane Doe (BP)");
        assert_eq!(first, "Jane");
        assert_eq!(last, "Doe");
    }

    #[test]
    fn conditions_from_class() {
        assert_eq!(conditions_for_therapeutic_class("HMG-CoA Reductase Inhibitor Statin"), vec!["Hyperlipidemia"]);
        assert_eq!(conditions_for_therapeutic_class("INSULIN ANALOG"), vec!["Diabetes"]);
    }
}
