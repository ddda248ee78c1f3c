//! Postgres-backed `TriggerBinValueRepository` (§3, §4.3, §5, §6).

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{CoverageStatus, TriggerBinValue};
use crate::domain::repositories::TriggerBinValueRepository;
use crate::infrastructure::database::queries::trigger_bin_values::{
    TRIGGER_BIN_VALUE_DELETE_NON_EXCLUDED, TRIGGER_BIN_VALUE_FIND_ANY_BIN_ONLY,
    TRIGGER_BIN_VALUE_FIND_ANY_WITH_GROUP, TRIGGER_BIN_VALUE_FIND_MATCH_BIN_ONLY,
    TRIGGER_BIN_VALUE_FIND_MATCH_WITH_GROUP, TRIGGER_BIN_VALUE_FIND_VERIFIED_FOR_TRIGGER,
    TRIGGER_BIN_VALUE_UPSERT,
};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

#[derive(Debug, FromRow)]
struct TriggerBinValueRow {
    id: Uuid,
    trigger_id: Uuid,
    bin: String,
    group_number: Option<String>,
    coverage_status: String,
    verified_claim_count: i64,
    avg_reimbursement: BigDecimal,
    avg_qty: BigDecimal,
    gp_value: BigDecimal,
    best_drug_name: Option<String>,
    best_ndc: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    is_excluded: bool,
}

impl From<TriggerBinValueRow> for TriggerBinValue {
    fn from(row: TriggerBinValueRow) -> Self {
        let coverage_status = match row.coverage_status.as_str() {
            "verified" => CoverageStatus::Verified,
            "excluded" => CoverageStatus::Excluded,
            _ => CoverageStatus::Unknown,
        };
        TriggerBinValue {
            id: row.id,
            trigger_id: row.trigger_id,
            bin: row.bin,
            group: row.group_number,
            coverage_status,
            verified_claim_count: row.verified_claim_count,
            avg_reimbursement: row.avg_reimbursement,
            avg_qty: row.avg_qty,
            gp_value: row.gp_value,
            best_drug_name: row.best_drug_name,
            best_ndc: row.best_ndc,
            verified_at: row.verified_at,
            is_excluded: row.is_excluded,
        }
    }
}

pub struct TriggerBinValueRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl TriggerBinValueRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl TriggerBinValueRepository for TriggerBinValueRepositoryImpl {
    /// §5 "atomic per trigger": delete-then-upsert runs inside a single
    /// transaction so a concurrent evaluator scan never observes a
    /// trigger with zero `TriggerBinValue` rows mid-write.
    async fn replace_verified_for_trigger(&self, trigger_id: Uuid, rows: &[TriggerBinValue]) -> AppResult<()> {
        let mut tx = self
            .database_service
            .pool()
            .begin()
            .await
            .map_db_error("begin_transaction", "trigger_bin_value")?;

        sqlx::query(TRIGGER_BIN_VALUE_DELETE_NON_EXCLUDED)
            .bind(trigger_id)
            .execute(&mut *tx)
            .await
            .map_db_error("delete", "trigger_bin_value")?;

        for row in rows {
            sqlx::query(TRIGGER_BIN_VALUE_UPSERT)
                .bind(row.id)
                .bind(row.trigger_id)
                .bind(&row.bin)
                .bind(&row.group)
                .bind(row.coverage_status.as_str())
                .bind(row.verified_claim_count)
                .bind(row.avg_reimbursement.clone())
                .bind(row.avg_qty.clone())
                .bind(row.gp_value.clone())
                .bind(&row.best_drug_name)
                .bind(&row.best_ndc)
                .bind(row.verified_at)
                .bind(row.is_excluded)
                .execute(&mut *tx)
                .await
                .map_db_error("upsert", "trigger_bin_value")?;
        }

        tx.commit().await.map_db_error("commit_transaction", "trigger_bin_value")?;
        Ok(())
    }

    async fn find_match(&self, trigger_id: Uuid, bin: &str, group: Option<&str>) -> AppResult<Option<TriggerBinValue>> {
        let row = sqlx::query_as::<_, TriggerBinValueRow>(TRIGGER_BIN_VALUE_FIND_MATCH_WITH_GROUP)
            .bind(trigger_id)
            .bind(bin)
            .bind(group)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger_bin_value")?;
        if row.is_some() {
            return Ok(row.map(TriggerBinValue::from));
        }

        sqlx::query_as::<_, TriggerBinValueRow>(TRIGGER_BIN_VALUE_FIND_MATCH_BIN_ONLY)
            .bind(trigger_id)
            .bind(bin)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger_bin_value")
            .map(|row| row.map(TriggerBinValue::from))
    }

    async fn find_match_including_excluded(&self, trigger_id: Uuid, bin: &str, group: Option<&str>) -> AppResult<Option<TriggerBinValue>> {
        let row = sqlx::query_as::<_, TriggerBinValueRow>(TRIGGER_BIN_VALUE_FIND_ANY_WITH_GROUP)
            .bind(trigger_id)
            .bind(bin)
            .bind(group)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger_bin_value")?;
        if row.is_some() {
            return Ok(row.map(TriggerBinValue::from));
        }

        sqlx::query_as::<_, TriggerBinValueRow>(TRIGGER_BIN_VALUE_FIND_ANY_BIN_ONLY)
            .bind(trigger_id)
            .bind(bin)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger_bin_value")
            .map(|row| row.map(TriggerBinValue::from))
    }

    async fn find_verified_for_trigger(&self, trigger_id: Uuid) -> AppResult<Vec<TriggerBinValue>> {
        sqlx::query_as::<_, TriggerBinValueRow>(TRIGGER_BIN_VALUE_FIND_VERIFIED_FOR_TRIGGER)
            .bind(trigger_id)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger_bin_value")
            .map(|rows| rows.into_iter().map(TriggerBinValue::from).collect())
    }
}
