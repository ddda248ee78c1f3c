//! `rxscan evaluate <pharmacy_id> [--lookback-days N]` (§4.2, §6).

use std::sync::Arc;

use rxscan_core::application::TriggerEvaluator;
use rxscan_core::infrastructure::database::DatabaseService;
use rxscan_core::infrastructure::repositories::{
    OpportunityRepositoryImpl, PharmacyRepositoryImpl, PrescriptionRepositoryImpl, TriggerBinValueRepositoryImpl, TriggerRepositoryImpl,
};
use tracing::info;
use uuid::Uuid;

pub async fn run(database_service: Arc<DatabaseService>, pharmacy_id: Uuid, lookback_days: i64) -> anyhow::Result<()> {
    let evaluator = TriggerEvaluator::new(
        Arc::new(TriggerRepositoryImpl::new(database_service.clone())),
        Arc::new(PrescriptionRepositoryImpl::new(database_service.clone())),
        Arc::new(PharmacyRepositoryImpl::new(database_service.clone())),
        Arc::new(OpportunityRepositoryImpl::new(database_service.clone())),
        Arc::new(TriggerBinValueRepositoryImpl::new(database_service)),
    );

    info!(%pharmacy_id, lookback_days, "starting trigger evaluation");
    let summary = evaluator.scan(pharmacy_id, lookback_days).await?;

    let report = serde_json::json!({
        "created": summary.created,
        "skipped_duplicates": summary.skipped_duplicates,
        "invariant_breaches": summary.invariant_breaches,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
