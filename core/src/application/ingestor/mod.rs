//! Claims ingestion pipeline (§4.1): header-agnostic CSV/TSV parse,
//! patient identity resolution, and batched idempotent upsert.

pub mod aliases;

use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::entities::{patient_hash, IngestionLog, IngestionStatus};
use crate::domain::repositories::{
    IngestionLogRepository, PatientRepository, PatientUpsert, PrescriptionRepository, PrescriptionUpsert,
};
use crate::shared::normalize::{
    conditions_for_therapeutic_class, normalize_amount, normalize_bin, normalize_date, normalize_ndc, parse_patient_name,
};
use crate::shared::AppResult;

/// §5 "batching is mandatory": rows per upsert statement, within the
/// 50-500 range §4.1 recommends.
const BATCH_SIZE: usize = 500;
/// §7: per-kind error messages are capped to the first N (<=20).
const MAX_ERROR_SAMPLES: usize = 20;
/// §7.3: transient store errors are retried at the batch boundary.
const MAX_BATCH_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub records_received: i64,
    pub records_processed: i64,
    pub records_failed: i64,
    pub patients_touched: i64,
    pub status: IngestionStatus,
    pub errors: Vec<String>,
}

struct ParsedRow {
    rx_number: Option<String>,
    drug_name: String,
    ndc: String,
    quantity: bigdecimal::BigDecimal,
    days_supply: Option<i32>,
    dispensed_date: chrono::NaiveDate,
    first_name: String,
    last_name: String,
    dob: Option<chrono::NaiveDate>,
    insurance_bin: String,
    insurance_group: Option<String>,
    contract_id: Option<String>,
    plan_name: Option<String>,
    patient_pay: bigdecimal::BigDecimal,
    insurance_pay: bigdecimal::BigDecimal,
    acquisition_cost: bigdecimal::BigDecimal,
    prescriber_name: Option<String>,
    daw_code: Option<String>,
    raw: HashMap<String, String>,
}

pub struct Ingestor {
    patient_repository: Arc<dyn PatientRepository>,
    prescription_repository: Arc<dyn PrescriptionRepository>,
    ingestion_log_repository: Arc<dyn IngestionLogRepository>,
}

impl Ingestor {
    pub fn new(
        patient_repository: Arc<dyn PatientRepository>,
        prescription_repository: Arc<dyn PrescriptionRepository>,
        ingestion_log_repository: Arc<dyn IngestionLogRepository>,
    ) -> Self {
        Self {
            patient_repository,
            prescription_repository,
            ingestion_log_repository,
        }
    }

    /// `Ingest(pharmacy_id, source_bytes, filename) -> {received, processed,
    /// failed, patients_touched}` (§4.1 public contract).
    pub async fn ingest(&self, pharmacy_id: Uuid, source_bytes: &[u8], filename: &str) -> AppResult<IngestSummary> {
        let text = String::from_utf8_lossy(source_bytes);
        let mut errors: Vec<String> = Vec::new();

        let Some(header_line) = text.lines().find(|l| !l.trim().is_empty()) else {
            let summary = IngestSummary {
                records_received: 0,
                records_processed: 0,
                records_failed: 0,
                patients_touched: 0,
                status: IngestionStatus::Failed,
                errors: vec!["file has no rows".to_string()],
            };
            self.write_log(pharmacy_id, filename, &summary).await?;
            return Ok(summary);
        };

        // §4.1 "Delimiter is auto-detected: tab if present in the header,
        // otherwise comma."
        let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };
        let content_start = text.find(header_line).unwrap_or(0);
        let content = &text[content_start..];

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .has_headers(true)
            .from_reader(content.as_bytes());

        let headers = match reader.headers() {
            Ok(h) => h.clone(),
            Err(e) => {
                let summary = IngestSummary {
                    records_received: 0,
                    records_processed: 0,
                    records_failed: 0,
                    patients_touched: 0,
                    status: IngestionStatus::Failed,
                    errors: vec![format!("invalid header row: {e}")],
                };
                self.write_log(pharmacy_id, filename, &summary).await?;
                return Ok(summary);
            }
        };
        let field_index = build_field_index(&headers);

        let mut received: i64 = 0;
        let mut failed: i64 = 0;

        // §3 Patient, §4.1 step 1: map keyed by patient_hash, conditions
        // merge across rows for the same hash.
        let mut patients: HashMap<String, PatientUpsert> = HashMap::new();
        // §4.1 "Deduplication within a batch": last occurrence of
        // (rx_number, dispensed_date) wins.
        let mut prescriptions: HashMap<(String, chrono::NaiveDate), (String, PrescriptionUpsert)> = HashMap::new();

        for (row_index, record) in reader.records().enumerate() {
            received += 1;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    failed += 1;
                    push_error(&mut errors, format!("row {row_index}: malformed CSV record: {e}"));
                    continue;
                }
            };

            match parse_row(&headers, &field_index, &record) {
                Ok(parsed) => {
                    let hash = patient_hash(&parsed.last_name, &parsed.first_name, parsed.dob, parsed.rx_number.as_deref());
                    let conditions: BTreeSet<String> = parsed
                        .raw
                        .get(THERAPEUTIC_CLASS_RAW_KEY)
                        .map(|class| conditions_for_therapeutic_class(class).into_iter().map(String::from).collect())
                        .unwrap_or_default();

                    patients
                        .entry(hash.clone())
                        .and_modify(|p| {
                            p.chronic_conditions.extend(conditions.iter().cloned());
                            if p.primary_bin.is_none() {
                                p.primary_bin = Some(parsed.insurance_bin.clone());
                            }
                            if p.primary_group.is_none() {
                                p.primary_group = parsed.insurance_group.clone();
                            }
                        })
                        .or_insert_with(|| PatientUpsert {
                            pharmacy_id,
                            patient_hash: hash.clone(),
                            first_name: parsed.first_name.clone(),
                            last_name: parsed.last_name.clone(),
                            date_of_birth: parsed.dob,
                            chronic_conditions: conditions,
                            primary_bin: Some(parsed.insurance_bin.clone()),
                            primary_group: parsed.insurance_group.clone(),
                        });

                    let rx_number = parsed.rx_number.clone().unwrap_or_default();
                    let key = (rx_number.clone(), parsed.dispensed_date);
                    let upsert = PrescriptionUpsert {
                        pharmacy_id,
                        patient_id: Uuid::nil(), // resolved after the patient batch upsert
                        rx_number,
                        drug_name: parsed.drug_name,
                        ndc: parsed.ndc,
                        quantity: parsed.quantity,
                        days_supply: parsed.days_supply,
                        dispensed_date: parsed.dispensed_date,
                        insurance_bin: parsed.insurance_bin,
                        insurance_group: parsed.insurance_group,
                        contract_id: parsed.contract_id,
                        plan_name: parsed.plan_name,
                        patient_pay: parsed.patient_pay,
                        insurance_pay: parsed.insurance_pay,
                        acquisition_cost: parsed.acquisition_cost,
                        prescriber_name: parsed.prescriber_name,
                        daw_code: parsed.daw_code,
                        raw: parsed.raw,
                    };
                    prescriptions.insert(key, (hash, upsert));
                }
                Err(reason) => {
                    failed += 1;
                    push_error(&mut errors, format!("row {row_index}: {reason}"));
                }
            }
        }

        let patient_rows: Vec<PatientUpsert> = patients.into_values().collect();
        let (resolved_ids, patient_failures) = self.upsert_patients(&patient_rows, &mut errors).await?;
        failed += patient_failures;

        let mut prescription_rows: Vec<PrescriptionUpsert> = Vec::with_capacity(prescriptions.len());
        for (_, (hash, mut upsert)) in prescriptions {
            match resolved_ids.get(&hash) {
                Some(id) => {
                    upsert.patient_id = *id;
                    prescription_rows.push(upsert);
                }
                None => {
                    failed += 1;
                    push_error(&mut errors, format!("rx {}: patient could not be resolved", upsert.rx_number));
                }
            }
        }

        let prescription_failures = self.upsert_prescriptions(&prescription_rows, &mut errors).await?;
        failed += prescription_failures;

        let processed = received - failed;
        let status = if failed == 0 {
            IngestionStatus::Success
        } else if processed > 0 {
            IngestionStatus::Partial
        } else {
            IngestionStatus::Failed
        };

        let summary = IngestSummary {
            records_received: received,
            records_processed: processed.max(0),
            records_failed: failed,
            patients_touched: resolved_ids.len() as i64,
            status,
            errors,
        };
        self.write_log(pharmacy_id, filename, &summary).await?;
        Ok(summary)
    }

    /// §4.1 step 2 + §7.3: batched upsert with exponential-backoff retry
    /// at the batch boundary, falling back to per-row writes so a single
    /// malformed row never aborts the whole batch.
    async fn upsert_patients(
        &self,
        rows: &[PatientUpsert],
        errors: &mut Vec<String>,
    ) -> AppResult<HashMap<String, Uuid>> {
        let mut resolved = HashMap::new();
        for chunk in rows.chunks(BATCH_SIZE) {
            match self.batch_with_retry(chunk, |c| self.patient_repository.batch_upsert(c)).await {
                Ok(pairs) => resolved.extend(pairs),
                Err(_) => {
                    for row in chunk {
                        match self.patient_repository.batch_upsert(std::slice::from_ref(row)).await {
                            Ok(pairs) => resolved.extend(pairs),
                            Err(e) => push_error(errors, format!("patient {}: {e}", row.patient_hash)),
                        }
                    }
                }
            }
        }
        Ok(resolved)
    }

    async fn upsert_prescriptions(&self, rows: &[PrescriptionUpsert], errors: &mut Vec<String>) -> AppResult<i64> {
        let mut failed = 0i64;
        for chunk in rows.chunks(BATCH_SIZE) {
            if self.prescription_repository.batch_upsert(chunk).await.is_ok() {
                continue;
            }
            let mut succeeded_via_retry = false;
            for attempt in 1..=MAX_BATCH_RETRIES {
                tokio::time::sleep(backoff(attempt)).await;
                if self.prescription_repository.batch_upsert(chunk).await.is_ok() {
                    succeeded_via_retry = true;
                    break;
                }
            }
            if succeeded_via_retry {
                continue;
            }
            for row in chunk {
                if let Err(e) = self.prescription_repository.batch_upsert(std::slice::from_ref(row)).await {
                    failed += 1;
                    push_error(errors, format!("rx {}: {e}", row.rx_number));
                }
            }
        }
        Ok(failed)
    }

    async fn batch_with_retry<T, F, Fut>(&self, chunk: &[T], call: F) -> AppResult<Vec<(String, Uuid)>>
    where
        F: Fn(&[T]) -> Fut,
        Fut: std::future::Future<Output = AppResult<Vec<(String, Uuid)>>>,
    {
        let mut last_err = None;
        for attempt in 0..=MAX_BATCH_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }
            match call(chunk).await {
                Ok(result) => return Ok(result),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.expect("loop executes at least once"))
    }

    async fn write_log(&self, pharmacy_id: Uuid, filename: &str, summary: &IngestSummary) -> AppResult<()> {
        let log = IngestionLog {
            id: Uuid::new_v4(),
            pharmacy_id,
            source_type: "csv".to_string(),
            file_name: filename.to_string(),
            records_received: summary.records_received,
            records_processed: summary.records_processed,
            records_failed: summary.records_failed,
            status: summary.status,
            created_at: Utc::now(),
        };
        self.ingestion_log_repository.create(log).await?;
        Ok(())
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2u64.pow(attempt.saturating_sub(1)))
}

fn push_error(errors: &mut Vec<String>, message: String) {
    if errors.len() < MAX_ERROR_SAMPLES {
        errors.push(message);
    }
}

/// `canonical_field -> column index`, built once per file.
fn build_field_index(headers: &csv::StringRecord) -> HashMap<&'static str, usize> {
    let mut index = HashMap::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(canonical) = aliases::canonical_field(header) {
            index.entry(canonical).or_insert(i);
        }
    }
    index
}

const THERAPEUTIC_CLASS_RAW_KEY: &str = aliases::THERAPEUTIC_CLASS;

fn get<'a>(index: &HashMap<&'static str, usize>, record: &'a csv::StringRecord, field: &str) -> Option<&'a str> {
    index.get(field).and_then(|i| record.get(*i)).map(str::trim).filter(|s| !s.is_empty())
}

/// §4.1 "Row validation": rows missing `drug_name` OR both `patient_name`
/// and `rx_number` are skipped (counted failed, not fatal).
fn parse_row(headers: &csv::StringRecord, index: &HashMap<&'static str, usize>, record: &csv::StringRecord) -> Result<ParsedRow, String> {
    let drug_name = get(index, record, aliases::DRUG_NAME).ok_or_else(|| "missing drug_name".to_string())?;

    let rx_number = get(index, record, aliases::RX_NUMBER).map(str::to_string);
    let patient_name = get(index, record, aliases::PATIENT_NAME);
    let patient_first = get(index, record, aliases::PATIENT_FIRST_NAME);
    let patient_last = get(index, record, aliases::PATIENT_LAST_NAME);

    let has_patient_name = patient_name.is_some() || patient_first.is_some() || patient_last.is_some();
    if rx_number.is_none() && !has_patient_name {
        return Err("missing both patient_name and rx_number".to_string());
    }

    let (first_name, last_name) = if let Some(combined) = patient_name {
        parse_patient_name(combined)
    } else {
        (patient_first.unwrap_or_default().to_string(), patient_last.unwrap_or_default().to_string())
    };

    let dispensed_date = get(index, record, aliases::DISPENSED_DATE)
        .ok_or_else(|| "missing dispensed_date".to_string())
        .and_then(|d| normalize_date(d).map_err(|e| e.to_string()))?;

    let dob = get(index, record, aliases::PATIENT_DOB).and_then(|d| normalize_date(d).ok());

    let ndc_raw = get(index, record, aliases::NDC).unwrap_or("");
    let (ndc, ndc_valid) = normalize_ndc(ndc_raw);

    let quantity = get(index, record, aliases::QUANTITY).map(normalize_amount).unwrap_or_else(|| bigdecimal::BigDecimal::from(0));
    let days_supply = get(index, record, aliases::DAYS_SUPPLY).and_then(|d| d.parse::<i32>().ok());

    let insurance_bin = normalize_bin(get(index, record, aliases::INSURANCE_BIN).unwrap_or(""));
    let insurance_group = get(index, record, aliases::GROUP_NUMBER).map(str::to_string);
    let contract_id = get(index, record, aliases::CONTRACT_ID).map(str::to_string);
    let plan_name = get(index, record, aliases::PLAN_NAME).map(str::to_string);

    let patient_pay = get(index, record, aliases::PATIENT_PAY).map(normalize_amount).unwrap_or_else(|| bigdecimal::BigDecimal::from(0));
    let insurance_pay = get(index, record, aliases::INSURANCE_PAY).map(normalize_amount).unwrap_or_else(|| bigdecimal::BigDecimal::from(0));
    let acquisition_cost = get(index, record, aliases::ACQUISITION_COST).map(normalize_amount).unwrap_or_else(|| bigdecimal::BigDecimal::from(0));

    let prescriber_name = get(index, record, aliases::PRESCRIBER_NAME).map(str::to_string);
    let daw_code = get(index, record, aliases::DAW_CODE).map(str::to_string);

    let mut raw = HashMap::new();
    for (field, alias_key) in [
        (aliases::GROSS_PROFIT, "gross_profit"),
        (aliases::NET_PROFIT, "net_profit"),
        (aliases::AWP, "awp"),
        (aliases::THERAPEUTIC_CLASS, aliases::THERAPEUTIC_CLASS),
        (aliases::PLAN_NAME, "plan_name"),
        (aliases::SIG, "sig"),
    ] {
        if let Some(value) = get(index, record, field) {
            raw.insert(alias_key.to_string(), value.to_string());
        }
    }
    if !ndc_valid {
        raw.insert("ndc_length_flag".to_string(), "invalid".to_string());
    }

    // §4.1 "Unmapped columns are preserved in the prescription's raw bag."
    let mapped_indices: std::collections::HashSet<usize> = index.values().copied().collect();
    for (i, header) in headers.iter().enumerate() {
        if mapped_indices.contains(&i) {
            continue;
        }
        if let Some(value) = record.get(i).map(str::trim).filter(|s| !s.is_empty()) {
            raw.insert(header.to_string(), value.to_string());
        }
    }

    Ok(ParsedRow {
        rx_number,
        drug_name: drug_name.to_string(),
        ndc,
        quantity,
        days_supply,
        dispensed_date,
        first_name,
        last_name,
        dob,
        insurance_bin,
        insurance_group,
        contract_id,
        plan_name,
        patient_pay,
        insurance_pay,
        acquisition_cost,
        prescriber_name,
        daw_code,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_headers(line: &str) -> csv::StringRecord {
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(line.as_bytes());
        reader.records().next().unwrap().unwrap()
    }

    #[test]
    fn build_field_index_resolves_known_aliases() {
        let headers = csv_headers("Rx Number,Patient Full Name Last then First,Dispensed Item Name");
        let index = build_field_index(&headers);
        assert_eq!(index.get(aliases::RX_NUMBER), Some(&0));
        assert_eq!(index.get(aliases::PATIENT_NAME), Some(&1));
        assert_eq!(index.get(aliases::DRUG_NAME), Some(&2));
    }

    #[test]
    fn parse_row_rejects_missing_drug_name() {
        let headers = csv_headers("Rx Number,Patient Full Name Last then First");
        let index = build_field_index(&headers);
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader("1001,\"Doe, Jane\"".as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert!(parse_row(&headers, &index, &record).is_err());
    }

    #[test]
    fn parse_row_basic_scenario() {
        let headers = csv_headers(
            "Rx Number,Patient Full Name Last then First,Patient Date of Birth,Dispensed Item Name,Dispensed Item NDC,Dispensed Quantity,Days Supply,Date Written,Primary Third Party Bin",
        );
        let index = build_field_index(&headers);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("1001,\"Doe, Jane\",01/15/1960,Lisinopril 10mg,00093010501,30,30,01/02/2025,610097".as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        let parsed = parse_row(&headers, &index, &record).unwrap();
        assert_eq!(parsed.last_name, "Doe");
        assert_eq!(parsed.first_name, "Jane");
        assert_eq!(parsed.insurance_bin, "610097");
        assert_eq!(parsed.ndc, "00093010501");
        assert_eq!(parsed.dispensed_date, chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn parse_row_pads_short_bin() {
        let headers = csv_headers("Rx Number,Dispensed Item Name,Primary Third Party Bin");
        let index = build_field_index(&headers);
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader("1001,Lisinopril,4740".as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        let parsed = parse_row(&headers, &index, &record).unwrap();
        assert_eq!(parsed.insurance_bin, "004740");
    }
}
