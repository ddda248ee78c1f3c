pub mod ingestion_log_repository;
pub mod opportunity_audit_log_repository;
pub mod opportunity_repository;
pub mod patient_repository;
pub mod pharmacy_repository;
pub mod prescription_repository;
pub mod trigger_bin_value_repository;
pub mod trigger_repository;

pub use ingestion_log_repository::IngestionLogRepository;
pub use opportunity_audit_log_repository::OpportunityAuditLogRepository;
pub use opportunity_repository::OpportunityRepository;
pub use patient_repository::{PatientRepository, PatientUpsert};
pub use pharmacy_repository::PharmacyRepository;
pub use prescription_repository::{PrescriptionRepository, PrescriptionUpsert};
pub use trigger_bin_value_repository::TriggerBinValueRepository;
pub use trigger_repository::TriggerRepository;
