//! Keyword tokenization for the coverage scanner's candidate-claim search
//! and the evaluator's GP-cache patterns (§4.3 "Keyword extraction").

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// §4.3: dropped from search tokens regardless of case.
const STOP_WORDS: &[&str] = &[
    "mg", "ml", "mcg", "er", "sr", "xr", "dr", "hcl", "sodium", "potassium", "try", "alternates", "if",
    "fails", "before", "saying", "doesnt", "work", "the", "and", "for", "with", "to", "of",
];

/// Splits on alpha/digit runs separately, so a dose like `10mg` yields
/// the two tokens `10` and `mg` rather than one unfilterable blob.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+|\d+").unwrap());

/// Tokenizes free text by whitespace/punctuation, uppercases, and drops
/// tokens <=2 chars, all-digit tokens, and stop words (§4.3).
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_uppercase())
        .filter(|t| t.len() > 2)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOP_WORDS.iter().any(|s| s.eq_ignore_ascii_case(t)))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// `true` if every token in `set` is a substring of `drug_name_upper`
/// (AND within a set, per §4.3 "Candidate claims").
pub fn set_matches(drug_name_upper: &str, set: &[String]) -> bool {
    !set.is_empty() && set.iter().all(|token| drug_name_upper.contains(token.as_str()))
}

/// `true` if `drug_name_upper` satisfies at least one of `sets` (OR
/// across sets, per §4.3).
pub fn any_set_matches(drug_name_upper: &str, sets: &[Vec<String>]) -> bool {
    sets.iter().any(|set| set_matches(drug_name_upper, set))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_units_and_short_tokens() {
        let tokens = extract_keywords("Lisinopril 10mg Tab ER Try Alternates If Fails");
        assert_eq!(tokens, vec!["LISINOPRIL".to_string(), "TAB".to_string()]);
    }

    #[test]
    fn reports_no_searchable_keywords_for_unit_only_text() {
        assert!(extract_keywords("10mg ER").is_empty());
    }

    #[test]
    fn and_within_set_or_across_sets() {
        let sets = vec![
            vec!["LOSARTAN".to_string(), "POTASSIUM".to_string()],
            vec!["LISINOPRIL".to_string()],
        ];
        assert!(any_set_matches("LOSARTAN POTASSIUM 50MG", &sets));
        assert!(any_set_matches("LISINOPRIL 10MG", &sets));
        assert!(!any_set_matches("METFORMIN 500MG", &sets));
    }
}
