//! `rxscan scan-coverage [--min-margin N] [--days-back N]` (§4.3, §6).

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use rxscan_core::application::{CoverageScanParams, CoverageScanner};
use rxscan_core::config::ScanDefaults;
use rxscan_core::infrastructure::database::DatabaseService;
use rxscan_core::infrastructure::repositories::{
    OpportunityRepositoryImpl, PrescriptionRepositoryImpl, TriggerBinValueRepositoryImpl, TriggerRepositoryImpl,
};
use tracing::info;

pub async fn run(
    database_service: Arc<DatabaseService>,
    defaults: &ScanDefaults,
    min_claims: Option<i64>,
    days_back: Option<i64>,
    min_margin: Option<f64>,
    dme_min_margin: Option<f64>,
) -> anyhow::Result<()> {
    let params = CoverageScanParams {
        min_claims: min_claims.unwrap_or(defaults.min_claims),
        days_back: days_back.unwrap_or(defaults.days_back),
        min_margin: min_margin
            .map(|d| BigDecimal::from_str(&d.to_string()))
            .transpose()?
            .unwrap_or_else(|| cents_to_dollars(defaults.min_margin_cents)),
        dme_min_margin: dme_min_margin
            .map(|d| BigDecimal::from_str(&d.to_string()))
            .transpose()?
            .unwrap_or_else(|| cents_to_dollars(defaults.dme_min_margin_cents)),
    };

    let scanner = CoverageScanner::new(
        Arc::new(TriggerRepositoryImpl::new(database_service.clone())),
        Arc::new(PrescriptionRepositoryImpl::new(database_service.clone())),
        Arc::new(TriggerBinValueRepositoryImpl::new(database_service.clone())),
        Arc::new(OpportunityRepositoryImpl::new(database_service)),
    );

    info!(min_claims = params.min_claims, days_back = params.days_back, "starting coverage scan");
    let result = scanner.scan_all_coverage(params).await?;

    let report = serde_json::json!({
        "summary": {
            "triggers_scanned": result.summary.triggers_scanned,
            "total_verified_rows": result.summary.total_verified_rows,
            "opportunities_backpropagated": result.summary.opportunities_backpropagated,
            "opportunities_cleaned_up": result.summary.opportunities_cleaned_up,
            "invariant_breaches": result.summary.invariant_breaches,
        },
        "per_trigger_results": result.per_trigger_results.iter().map(|r| serde_json::json!({
            "trigger_id": r.trigger_id,
            "trigger_code": r.trigger_code,
            "verified_rows": r.verified_rows,
            "disabled": r.disabled,
            "cleaned_up_opportunities": r.cleaned_up_opportunities,
        })).collect::<Vec<_>>(),
        "no_match_list": result.no_match_list.iter().map(|n| serde_json::json!({
            "trigger_id": n.trigger_id,
            "trigger_code": n.trigger_code,
            "reason": n.reason,
        })).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn cents_to_dollars(cents: i64) -> BigDecimal {
    BigDecimal::from(cents) / BigDecimal::from(100)
}
