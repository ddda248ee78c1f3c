pub const INGESTION_LOG_INSERT: &str = r#"
    INSERT INTO ingestion_log (
        id, pharmacy_id, source_type, file_name, records_received, records_processed,
        records_failed, status, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING id, pharmacy_id, source_type, file_name, records_received, records_processed,
              records_failed, status, created_at
"#;
