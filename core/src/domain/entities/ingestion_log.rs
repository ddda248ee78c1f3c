//! IngestionLog — summary row written once per ingest job (§6, §7).

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionStatus {
    Success,
    Partial,
    Failed,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Success => "success",
            IngestionStatus::Partial => "partial",
            IngestionStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionLog {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    pub source_type: String,
    pub file_name: String,
    pub records_received: i64,
    pub records_processed: i64,
    pub records_failed: i64,
    pub status: IngestionStatus,
    pub created_at: DateTime<Utc>,
}
