pub const OPPORTUNITY_AUDIT_LOG_INSERT: &str = r#"
    INSERT INTO opportunity_audit_log (id, opportunity_id, from_status, to_status, actor, timestamp, reason)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id, opportunity_id, from_status, to_status, actor, timestamp, reason
"#;

pub const OPPORTUNITY_AUDIT_LOG_FIND_FOR_OPPORTUNITY: &str = r#"
    SELECT id, opportunity_id, from_status, to_status, actor, timestamp, reason
    FROM opportunity_audit_log
    WHERE opportunity_id = $1
    ORDER BY timestamp ASC
"#;

/// §3 "MUST NOT be deleted": true once any entry's `to_status` left
/// `Not Submitted` into one of {Submitted, Approved, Completed, Denied}.
pub const OPPORTUNITY_AUDIT_LOG_HAS_LEFT_NOT_SUBMITTED: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM opportunity_audit_log
        WHERE opportunity_id = $1
          AND from_status = 'Not Submitted'
          AND to_status IN ('Submitted', 'Approved', 'Completed', 'Denied')
    )
"#;
