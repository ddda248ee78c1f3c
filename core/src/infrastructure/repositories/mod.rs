pub mod ingestion_log_repository_impl;
pub mod opportunity_audit_log_repository_impl;
pub mod opportunity_repository_impl;
pub mod patient_repository_impl;
pub mod pharmacy_repository_impl;
pub mod prescription_repository_impl;
pub mod trigger_bin_value_repository_impl;
pub mod trigger_repository_impl;

pub use ingestion_log_repository_impl::IngestionLogRepositoryImpl;
pub use opportunity_audit_log_repository_impl::OpportunityAuditLogRepositoryImpl;
pub use opportunity_repository_impl::OpportunityRepositoryImpl;
pub use patient_repository_impl::PatientRepositoryImpl;
pub use pharmacy_repository_impl::PharmacyRepositoryImpl;
pub use prescription_repository_impl::PrescriptionRepositoryImpl;
pub use trigger_bin_value_repository_impl::TriggerBinValueRepositoryImpl;
pub use trigger_repository_impl::TriggerRepositoryImpl;
