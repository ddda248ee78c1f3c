pub const OPPORTUNITY_COLUMNS: &str = r#"
    id, pharmacy_id, patient_id, prescription_id, trigger_id, opportunity_type,
    current_drug_name, current_ndc, recommended_drug_name, recommended_ndc,
    avg_dispensed_qty, potential_margin_gain, annual_margin_gain, clinical_rationale,
    status, created_at, reviewed_at, actioned_at
"#;

pub const OPPORTUNITY_INSERT: &str = r#"
    INSERT INTO opportunities (
        id, pharmacy_id, patient_id, prescription_id, trigger_id, opportunity_type,
        current_drug_name, current_ndc, recommended_drug_name, recommended_ndc,
        avg_dispensed_qty, potential_margin_gain, annual_margin_gain, clinical_rationale,
        status, created_at, reviewed_at, actioned_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
    RETURNING id, pharmacy_id, patient_id, prescription_id, trigger_id, opportunity_type,
              current_drug_name, current_ndc, recommended_drug_name, recommended_ndc,
              avg_dispensed_qty, potential_margin_gain, annual_margin_gain, clinical_rationale,
              status, created_at, reviewed_at, actioned_at
"#;

/// §3 dedup key: live opportunities have status not in {Denied, Declined}.
pub const OPPORTUNITY_FIND_LIVE_BY_DEDUP_KEY: &str = r#"
    SELECT id, pharmacy_id, patient_id, prescription_id, trigger_id, opportunity_type,
           current_drug_name, current_ndc, recommended_drug_name, recommended_ndc,
           avg_dispensed_qty, potential_margin_gain, annual_margin_gain, clinical_rationale,
           status, created_at, reviewed_at, actioned_at
    FROM opportunities
    WHERE pharmacy_id = $1 AND patient_id = $2 AND upper(recommended_drug_name) = $3
      AND status NOT IN ('Denied', 'Declined')
    LIMIT 1
"#;

pub const OPPORTUNITY_FIND_NOT_SUBMITTED_FOR_TRIGGER: &str = r#"
    SELECT id, pharmacy_id, patient_id, prescription_id, trigger_id, opportunity_type,
           current_drug_name, current_ndc, recommended_drug_name, recommended_ndc,
           avg_dispensed_qty, potential_margin_gain, annual_margin_gain, clinical_rationale,
           status, created_at, reviewed_at, actioned_at
    FROM opportunities
    WHERE trigger_id = $1 AND status = 'Not Submitted'
"#;

/// §3 "mutable while status = Not Submitted" — callers must not invoke
/// this once status has left that state.
pub const OPPORTUNITY_UPDATE_ECONOMICS: &str = r#"
    UPDATE opportunities
    SET potential_margin_gain = $2, annual_margin_gain = $3, avg_dispensed_qty = $4,
        recommended_ndc = $5
    WHERE id = $1 AND status = 'Not Submitted'
"#;

pub const OPPORTUNITY_DELETE_NOT_SUBMITTED_OUTSIDE_PHARMACIES: &str = r#"
    DELETE FROM opportunities
    WHERE trigger_id = $1 AND status = 'Not Submitted' AND NOT (pharmacy_id = ANY($2))
"#;

pub const OPPORTUNITY_FIND_BY_ID: &str = r#"
    SELECT id, pharmacy_id, patient_id, prescription_id, trigger_id, opportunity_type,
           current_drug_name, current_ndc, recommended_drug_name, recommended_ndc,
           avg_dispensed_qty, potential_margin_gain, annual_margin_gain, clinical_rationale,
           status, created_at, reviewed_at, actioned_at
    FROM opportunities
    WHERE id = $1
"#;

pub const OPPORTUNITY_UPDATE_STATUS: &str = r#"
    UPDATE opportunities
    SET status = $2, reviewed_at = COALESCE($3, reviewed_at), actioned_at = COALESCE($4, actioned_at)
    WHERE id = $1
    RETURNING id, pharmacy_id, patient_id, prescription_id, trigger_id, opportunity_type,
              current_drug_name, current_ndc, recommended_drug_name, recommended_ndc,
              avg_dispensed_qty, potential_margin_gain, annual_margin_gain, clinical_rationale,
              status, created_at, reviewed_at, actioned_at
"#;

/// §3/§5/§8: the database enforces that an opportunity whose audit log
/// ever recorded a transition out of `Not Submitted` cannot be deleted;
/// the repository checks `opportunity_audit_log` before issuing this.
pub const OPPORTUNITY_DELETE: &str = r#"
    DELETE FROM opportunities WHERE id = $1
"#;
