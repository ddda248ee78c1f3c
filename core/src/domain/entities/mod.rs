pub mod ingestion_log;
pub mod opportunity;
pub mod opportunity_audit_log;
pub mod patient;
pub mod pharmacy;
pub mod prescription;
pub mod trigger;
pub mod trigger_bin_value;

pub use ingestion_log::{IngestionLog, IngestionStatus};
pub use opportunity::{Opportunity, OpportunityStatus};
pub use opportunity_audit_log::OpportunityAuditLogEntry;
pub use patient::{patient_hash, Patient};
pub use pharmacy::Pharmacy;
pub use prescription::Prescription;
pub use trigger::{KeywordMatchMode, Trigger, TriggerType};
pub use trigger_bin_value::{CoverageStatus, TriggerBinValue};
