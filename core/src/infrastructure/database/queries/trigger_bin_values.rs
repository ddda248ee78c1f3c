/// §5 "the scanner deletes WHERE trigger_id = ? AND (is_excluded = false
/// OR is_excluded IS NULL)" — excluded rows survive every scan.
pub const TRIGGER_BIN_VALUE_DELETE_NON_EXCLUDED: &str = r#"
    DELETE FROM trigger_bin_values
    WHERE trigger_id = $1 AND (is_excluded = false OR is_excluded IS NULL)
"#;

/// Upsert is built per-row inside the same transaction as the delete
/// (§5 "atomic per trigger"); see `TriggerBinValueRepositoryImpl::replace_verified_for_trigger`.
pub const TRIGGER_BIN_VALUE_UPSERT: &str = r#"
    INSERT INTO trigger_bin_values (
        id, trigger_id, bin, group_number, coverage_status, verified_claim_count,
        avg_reimbursement, avg_qty, gp_value, best_drug_name, best_ndc, verified_at, is_excluded
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
    ON CONFLICT (trigger_id, bin, COALESCE(group_number, '')) DO UPDATE SET
        coverage_status = EXCLUDED.coverage_status,
        verified_claim_count = EXCLUDED.verified_claim_count,
        avg_reimbursement = EXCLUDED.avg_reimbursement,
        avg_qty = EXCLUDED.avg_qty,
        gp_value = EXCLUDED.gp_value,
        best_drug_name = EXCLUDED.best_drug_name,
        best_ndc = EXCLUDED.best_ndc,
        verified_at = EXCLUDED.verified_at,
        is_excluded = EXCLUDED.is_excluded
"#;

/// Back-propagation match (§4.3 step 4 "by BIN+group, non-excluded").
pub const TRIGGER_BIN_VALUE_FIND_MATCH_WITH_GROUP: &str = r#"
    SELECT id, trigger_id, bin, group_number, coverage_status, verified_claim_count,
           avg_reimbursement, avg_qty, gp_value, best_drug_name, best_ndc, verified_at, is_excluded
    FROM trigger_bin_values
    WHERE trigger_id = $1 AND bin = $2 AND COALESCE(group_number, '') = COALESCE($3, '')
      AND (is_excluded = false OR is_excluded IS NULL)
"#;

/// Back-propagation match (§4.3 step 4 "by BIN+group, non-excluded").
pub const TRIGGER_BIN_VALUE_FIND_MATCH_BIN_ONLY: &str = r#"
    SELECT id, trigger_id, bin, group_number, coverage_status, verified_claim_count,
           avg_reimbursement, avg_qty, gp_value, best_drug_name, best_ndc, verified_at, is_excluded
    FROM trigger_bin_values
    WHERE trigger_id = $1 AND bin = $2 AND group_number IS NULL
      AND (is_excluded = false OR is_excluded IS NULL)
"#;

/// Evaluator match (§4.2 step 4a): excluded rows must come back so the
/// caller's `if row.is_excluded { skip }` (§4.2 step 4 "If the matched
/// TriggerBinValue has is_excluded = true, skip") can fire.
pub const TRIGGER_BIN_VALUE_FIND_ANY_WITH_GROUP: &str = r#"
    SELECT id, trigger_id, bin, group_number, coverage_status, verified_claim_count,
           avg_reimbursement, avg_qty, gp_value, best_drug_name, best_ndc, verified_at, is_excluded
    FROM trigger_bin_values
    WHERE trigger_id = $1 AND bin = $2 AND COALESCE(group_number, '') = COALESCE($3, '')
"#;

/// Evaluator match (§4.2 step 4a): excluded rows must come back so the
/// caller's `if row.is_excluded { skip }` (§4.2 step 4 "If the matched
/// TriggerBinValue has is_excluded = true, skip") can fire.
pub const TRIGGER_BIN_VALUE_FIND_ANY_BIN_ONLY: &str = r#"
    SELECT id, trigger_id, bin, group_number, coverage_status, verified_claim_count,
           avg_reimbursement, avg_qty, gp_value, best_drug_name, best_ndc, verified_at, is_excluded
    FROM trigger_bin_values
    WHERE trigger_id = $1 AND bin = $2 AND group_number IS NULL
"#;

pub const TRIGGER_BIN_VALUE_FIND_VERIFIED_FOR_TRIGGER: &str = r#"
    SELECT id, trigger_id, bin, group_number, coverage_status, verified_claim_count,
           avg_reimbursement, avg_qty, gp_value, best_drug_name, best_ndc, verified_at, is_excluded
    FROM trigger_bin_values
    WHERE trigger_id = $1 AND coverage_status = 'verified'
"#;
