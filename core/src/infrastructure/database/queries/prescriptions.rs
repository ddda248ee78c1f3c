//! §4.1 step 2: the batch upsert is built dynamically with
//! `sqlx::QueryBuilder::push_values` in `PrescriptionRepositoryImpl::batch_upsert`,
//! keyed on `(pharmacy_id, rx_number, dispensed_date)`.

pub const PRESCRIPTION_FIND_RECENT_FOR_PHARMACY: &str = r#"
    SELECT id, pharmacy_id, patient_id, rx_number, drug_name, ndc, quantity, days_supply,
           dispensed_date, insurance_bin, insurance_group, contract_id, plan_name,
           patient_pay, insurance_pay, acquisition_cost, prescriber_name, daw_code, raw
    FROM prescriptions
    WHERE pharmacy_id = $1 AND dispensed_date >= $2
    ORDER BY dispensed_date DESC
"#;

pub const PRESCRIPTION_FIND_RECENT_FOR_PATIENT: &str = r#"
    SELECT id, pharmacy_id, patient_id, rx_number, drug_name, ndc, quantity, days_supply,
           dispensed_date, insurance_bin, insurance_group, contract_id, plan_name,
           patient_pay, insurance_pay, acquisition_cost, prescriber_name, daw_code, raw
    FROM prescriptions
    WHERE patient_id = $1 AND dispensed_date >= $2
    ORDER BY dispensed_date DESC
"#;

/// §4.3 "Candidate claims": drug name matches at least one keyword set
/// (the AND-within/OR-across token logic is applied in-process against
/// this superset — see `CoverageScanner::candidate_claims` — because
/// pushing per-set AND-of-ILIKE into SQL would need one dynamic clause
/// per keyword set anyway); BIN non-empty, dispensed within `days_back`.
pub const PRESCRIPTION_FIND_CANDIDATES_FOR_SCAN: &str = r#"
    SELECT id, pharmacy_id, patient_id, rx_number, drug_name, ndc, quantity, days_supply,
           dispensed_date, insurance_bin, insurance_group, contract_id, plan_name,
           patient_pay, insurance_pay, acquisition_cost, prescriber_name, daw_code, raw
    FROM prescriptions
    WHERE dispensed_date >= $1
      AND insurance_bin IS NOT NULL AND insurance_bin <> ''
      AND upper(drug_name) LIKE ANY($2)
"#;

pub const PRESCRIPTION_FIND_BY_ID: &str = r#"
    SELECT id, pharmacy_id, patient_id, rx_number, drug_name, ndc, quantity, days_supply,
           dispensed_date, insurance_bin, insurance_group, contract_id, plan_name,
           patient_pay, insurance_pay, acquisition_cost, prescriber_name, daw_code, raw
    FROM prescriptions
    WHERE id = $1
"#;

/// §4.3 "GP cache ... one wide query over prescriptions filtered by
/// unions of all recommended-drug keyword patterns within the last 365
/// days".
pub const PRESCRIPTION_FIND_FOR_GP_CACHE: &str = r#"
    SELECT id, pharmacy_id, patient_id, rx_number, drug_name, ndc, quantity, days_supply,
           dispensed_date, insurance_bin, insurance_group, contract_id, plan_name,
           patient_pay, insurance_pay, acquisition_cost, prescriber_name, daw_code, raw
    FROM prescriptions
    WHERE dispensed_date >= $1
      AND upper(drug_name) LIKE ANY($2)
"#;
