pub mod common;
pub mod ingestion_log;
pub mod opportunities;
pub mod opportunity_audit_log;
pub mod patients;
pub mod pharmacies;
pub mod prescriptions;
pub mod trigger_bin_values;
pub mod triggers;
