//! `rxscan ingest <pharmacy_id> <path>` (§4.1, §6).

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rxscan_core::application::Ingestor;
use rxscan_core::infrastructure::database::DatabaseService;
use rxscan_core::infrastructure::repositories::{IngestionLogRepositoryImpl, PatientRepositoryImpl, PrescriptionRepositoryImpl};
use tracing::info;
use uuid::Uuid;

pub async fn run(database_service: Arc<DatabaseService>, pharmacy_id: Uuid, path: &Path) -> anyhow::Result<()> {
    let source_bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("upload").to_string();

    let ingestor = Ingestor::new(
        Arc::new(PatientRepositoryImpl::new(database_service.clone())),
        Arc::new(PrescriptionRepositoryImpl::new(database_service.clone())),
        Arc::new(IngestionLogRepositoryImpl::new(database_service)),
    );

    info!(%pharmacy_id, %filename, "starting ingest");
    let summary = ingestor.ingest(pharmacy_id, &source_bytes, &filename).await?;

    let report = serde_json::json!({
        "records_received": summary.records_received,
        "records_processed": summary.records_processed,
        "records_failed": summary.records_failed,
        "patients_touched": summary.patients_touched,
        "status": format!("{:?}", summary.status),
        "errors": summary.errors,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
