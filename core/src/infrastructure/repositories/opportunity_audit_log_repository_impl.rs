//! Postgres-backed `OpportunityAuditLogRepository` (§3 "append-only record").

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{OpportunityAuditLogEntry, OpportunityStatus};
use crate::domain::repositories::OpportunityAuditLogRepository;
use crate::infrastructure::database::queries::opportunity_audit_log::{
    OPPORTUNITY_AUDIT_LOG_FIND_FOR_OPPORTUNITY, OPPORTUNITY_AUDIT_LOG_HAS_LEFT_NOT_SUBMITTED,
    OPPORTUNITY_AUDIT_LOG_INSERT,
};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: Uuid,
    opportunity_id: Uuid,
    from_status: String,
    to_status: String,
    actor: Option<String>,
    timestamp: DateTime<Utc>,
    reason: Option<String>,
}

impl From<AuditLogRow> for OpportunityAuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        OpportunityAuditLogEntry {
            id: row.id,
            opportunity_id: row.opportunity_id,
            from_status: OpportunityStatus::from_str(&row.from_status).unwrap_or(OpportunityStatus::NotSubmitted),
            to_status: OpportunityStatus::from_str(&row.to_status).unwrap_or(OpportunityStatus::NotSubmitted),
            actor: row.actor,
            timestamp: row.timestamp,
            reason: row.reason,
        }
    }
}

pub struct OpportunityAuditLogRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl OpportunityAuditLogRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl OpportunityAuditLogRepository for OpportunityAuditLogRepositoryImpl {
    async fn append(&self, entry: OpportunityAuditLogEntry) -> AppResult<OpportunityAuditLogEntry> {
        let row = sqlx::query_as::<_, AuditLogRow>(OPPORTUNITY_AUDIT_LOG_INSERT)
            .bind(entry.id)
            .bind(entry.opportunity_id)
            .bind(entry.from_status.as_str())
            .bind(entry.to_status.as_str())
            .bind(&entry.actor)
            .bind(entry.timestamp)
            .bind(&entry.reason)
            .fetch_one(self.database_service.pool())
            .await
            .map_db_error("insert", "opportunity_audit_log")?;
        Ok(row.into())
    }

    async fn find_for_opportunity(&self, opportunity_id: Uuid) -> AppResult<Vec<OpportunityAuditLogEntry>> {
        sqlx::query_as::<_, AuditLogRow>(OPPORTUNITY_AUDIT_LOG_FIND_FOR_OPPORTUNITY)
            .bind(opportunity_id)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "opportunity_audit_log")
            .map(|rows| rows.into_iter().map(OpportunityAuditLogEntry::from).collect())
    }

    async fn has_left_not_submitted(&self, opportunity_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar(OPPORTUNITY_AUDIT_LOG_HAS_LEFT_NOT_SUBMITTED)
            .bind(opportunity_id)
            .fetch_one(self.database_service.pool())
            .await
            .map_db_error("fetch", "opportunity_audit_log")
    }
}
