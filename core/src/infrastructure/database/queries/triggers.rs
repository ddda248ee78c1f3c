pub const TRIGGER_COLUMNS: &str = r#"
    id, code, display_name, trigger_type, category, enabled, priority,
    detection_keywords, exclude_keywords, if_has_keywords, if_not_has_keywords,
    keyword_match_mode, expected_qty, expected_days_supply,
    recommended_drug, recommended_ndc, pharmacy_inclusions, bin_inclusions,
    bin_exclusions, group_inclusions, group_exclusions, contract_prefix_exclusions,
    annual_fills, default_gp_value, min_margin_default, clinical_rationale,
    action_instructions, synced_at
"#;

/// §4.2 "Ordering & tie-breaks": ascending priority order.
pub const TRIGGER_FIND_ENABLED_FOR_PHARMACY: &str = r#"
    SELECT id, code, display_name, trigger_type, category, enabled, priority,
           detection_keywords, exclude_keywords, if_has_keywords, if_not_has_keywords,
           keyword_match_mode, expected_qty, expected_days_supply,
           recommended_drug, recommended_ndc, pharmacy_inclusions, bin_inclusions,
           bin_exclusions, group_inclusions, group_exclusions, contract_prefix_exclusions,
           annual_fills, default_gp_value, min_margin_default, clinical_rationale,
           action_instructions, synced_at
    FROM triggers
    WHERE enabled = true
      AND (array_length(pharmacy_inclusions, 1) IS NULL OR $1 = ANY(pharmacy_inclusions))
    ORDER BY priority ASC
"#;

pub const TRIGGER_FIND_ALL_ENABLED: &str = r#"
    SELECT id, code, display_name, trigger_type, category, enabled, priority,
           detection_keywords, exclude_keywords, if_has_keywords, if_not_has_keywords,
           keyword_match_mode, expected_qty, expected_days_supply,
           recommended_drug, recommended_ndc, pharmacy_inclusions, bin_inclusions,
           bin_exclusions, group_inclusions, group_exclusions, contract_prefix_exclusions,
           annual_fills, default_gp_value, min_margin_default, clinical_rationale,
           action_instructions, synced_at
    FROM triggers
    WHERE enabled = true
    ORDER BY priority ASC
"#;

pub const TRIGGER_FIND_BY_ID: &str = r#"
    SELECT id, code, display_name, trigger_type, category, enabled, priority,
           detection_keywords, exclude_keywords, if_has_keywords, if_not_has_keywords,
           keyword_match_mode, expected_qty, expected_days_supply,
           recommended_drug, recommended_ndc, pharmacy_inclusions, bin_inclusions,
           bin_exclusions, group_inclusions, group_exclusions, contract_prefix_exclusions,
           annual_fills, default_gp_value, min_margin_default, clinical_rationale,
           action_instructions, synced_at
    FROM triggers
    WHERE id = $1
"#;

/// §4.3 step 3: median of per-(bin,group) mean GPs; does not touch
/// `recommended_ndc` (admin-configured, §4.3 step 3).
pub const TRIGGER_UPDATE_DEFAULT_GP_VALUE: &str = r#"
    UPDATE triggers
    SET default_gp_value = $2, synced_at = $3
    WHERE id = $1
"#;

/// §4.3 step 5: zero verified rows disables the trigger for manual review.
pub const TRIGGER_DISABLE: &str = r#"
    UPDATE triggers
    SET enabled = false
    WHERE id = $1
"#;
