//! Pharmacy — the tenant scope (§3).

use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Pharmacy {
    pub id: Uuid,
    pub name: String,
    /// Only `excluded_bins` is consumed by the core today; everything else
    /// round-trips untouched.
    pub settings: HashMap<String, Value>,
}

impl Pharmacy {
    /// BINs this pharmacy has marked as cash/invalid — opportunities must
    /// never be produced for claims on these BINs (§4.2 step 2).
    pub fn excluded_bins(&self) -> Vec<String> {
        match self.settings.get("excluded_bins") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_bins_reads_array_setting() {
        let mut settings = HashMap::new();
        settings.insert(
            "excluded_bins".to_string(),
            serde_json::json!(["014798", "999999"]),
        );
        let pharmacy = Pharmacy {
            id: Uuid::nil(),
            name: "Test Rx".to_string(),
            settings,
        };
        assert_eq!(pharmacy.excluded_bins(), vec!["014798", "999999"]);
    }

    #[test]
    fn excluded_bins_defaults_empty() {
        let pharmacy = Pharmacy {
            id: Uuid::nil(),
            name: "Test Rx".to_string(),
            settings: HashMap::new(),
        };
        assert!(pharmacy.excluded_bins().is_empty());
    }
}
