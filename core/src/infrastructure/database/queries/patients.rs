//! §4.1 step 2: the batch upsert itself is built dynamically with
//! `sqlx::QueryBuilder::push_values` in `PatientRepositoryImpl::batch_upsert`
//! so 50-500 rows land in a single statement, per §5 "batching is
//! mandatory." These constants cover the remaining single-row lookups.

pub const PATIENT_FIND_BY_HASH: &str = r#"
    SELECT id, pharmacy_id, patient_hash, first_name, last_name, date_of_birth,
           chronic_conditions, primary_bin, primary_group
    FROM patients
    WHERE pharmacy_id = $1 AND patient_hash = $2
"#;

pub const PATIENT_FIND_BY_ID: &str = r#"
    SELECT id, pharmacy_id, patient_hash, first_name, last_name, date_of_birth,
           chronic_conditions, primary_bin, primary_group
    FROM patients
    WHERE id = $1
"#;
