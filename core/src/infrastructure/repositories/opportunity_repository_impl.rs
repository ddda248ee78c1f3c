//! Postgres-backed `OpportunityRepository` (§3, §4.2, §4.3, §5, §8).

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{Opportunity, OpportunityStatus};
use crate::domain::repositories::OpportunityRepository;
use crate::infrastructure::database::queries::opportunities::{
    OPPORTUNITY_DELETE, OPPORTUNITY_DELETE_NOT_SUBMITTED_OUTSIDE_PHARMACIES, OPPORTUNITY_FIND_BY_ID,
    OPPORTUNITY_FIND_LIVE_BY_DEDUP_KEY, OPPORTUNITY_FIND_NOT_SUBMITTED_FOR_TRIGGER, OPPORTUNITY_INSERT,
    OPPORTUNITY_UPDATE_ECONOMICS, OPPORTUNITY_UPDATE_STATUS,
};
use crate::infrastructure::database::queries::opportunity_audit_log::OPPORTUNITY_AUDIT_LOG_HAS_LEFT_NOT_SUBMITTED;
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::{AppError, AppResult};

#[derive(Debug, FromRow)]
struct OpportunityRow {
    id: Uuid,
    pharmacy_id: Uuid,
    patient_id: Uuid,
    prescription_id: Uuid,
    trigger_id: Uuid,
    opportunity_type: String,
    current_drug_name: String,
    current_ndc: String,
    recommended_drug_name: String,
    recommended_ndc: Option<String>,
    avg_dispensed_qty: BigDecimal,
    potential_margin_gain: BigDecimal,
    annual_margin_gain: BigDecimal,
    clinical_rationale: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    actioned_at: Option<DateTime<Utc>>,
}

impl From<OpportunityRow> for Opportunity {
    fn from(row: OpportunityRow) -> Self {
        Opportunity {
            id: row.id,
            pharmacy_id: row.pharmacy_id,
            patient_id: row.patient_id,
            prescription_id: row.prescription_id,
            trigger_id: row.trigger_id,
            opportunity_type: row.opportunity_type,
            current_drug_name: row.current_drug_name,
            current_ndc: row.current_ndc,
            recommended_drug_name: row.recommended_drug_name,
            recommended_ndc: row.recommended_ndc,
            avg_dispensed_qty: row.avg_dispensed_qty,
            potential_margin_gain: row.potential_margin_gain,
            annual_margin_gain: row.annual_margin_gain,
            clinical_rationale: row.clinical_rationale,
            status: OpportunityStatus::from_str(&row.status).unwrap_or(OpportunityStatus::NotSubmitted),
            created_at: row.created_at,
            reviewed_at: row.reviewed_at,
            actioned_at: row.actioned_at,
        }
    }
}

pub struct OpportunityRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl OpportunityRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl OpportunityRepository for OpportunityRepositoryImpl {
    async fn create(&self, opportunity: Opportunity) -> AppResult<Opportunity> {
        let row = sqlx::query_as::<_, OpportunityRow>(OPPORTUNITY_INSERT)
            .bind(opportunity.id)
            .bind(opportunity.pharmacy_id)
            .bind(opportunity.patient_id)
            .bind(opportunity.prescription_id)
            .bind(opportunity.trigger_id)
            .bind(&opportunity.opportunity_type)
            .bind(&opportunity.current_drug_name)
            .bind(&opportunity.current_ndc)
            .bind(&opportunity.recommended_drug_name)
            .bind(&opportunity.recommended_ndc)
            .bind(opportunity.avg_dispensed_qty)
            .bind(opportunity.potential_margin_gain)
            .bind(opportunity.annual_margin_gain)
            .bind(&opportunity.clinical_rationale)
            .bind(opportunity.status.as_str())
            .bind(opportunity.created_at)
            .bind(opportunity.reviewed_at)
            .bind(opportunity.actioned_at)
            .fetch_one(self.database_service.pool())
            .await
            .map_db_error("insert", "opportunity")?;
        Ok(row.into())
    }

    async fn find_live_by_dedup_key(
        &self,
        pharmacy_id: Uuid,
        patient_id: Uuid,
        recommended_drug_name_upper: &str,
    ) -> AppResult<Option<Opportunity>> {
        sqlx::query_as::<_, OpportunityRow>(OPPORTUNITY_FIND_LIVE_BY_DEDUP_KEY)
            .bind(pharmacy_id)
            .bind(patient_id)
            .bind(recommended_drug_name_upper)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "opportunity")
            .map(|row| row.map(Opportunity::from))
    }

    async fn find_not_submitted_for_trigger(&self, trigger_id: Uuid) -> AppResult<Vec<Opportunity>> {
        sqlx::query_as::<_, OpportunityRow>(OPPORTUNITY_FIND_NOT_SUBMITTED_FOR_TRIGGER)
            .bind(trigger_id)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "opportunity")
            .map(|rows| rows.into_iter().map(Opportunity::from).collect())
    }

    async fn update_economics(
        &self,
        opportunity_id: Uuid,
        potential_margin_gain: BigDecimal,
        annual_margin_gain: BigDecimal,
        avg_dispensed_qty: BigDecimal,
        recommended_ndc: Option<String>,
    ) -> AppResult<()> {
        sqlx::query(OPPORTUNITY_UPDATE_ECONOMICS)
            .bind(opportunity_id)
            .bind(potential_margin_gain)
            .bind(annual_margin_gain)
            .bind(avg_dispensed_qty)
            .bind(recommended_ndc)
            .execute(self.database_service.pool())
            .await
            .map_db_error("update", "opportunity")?;
        Ok(())
    }

    async fn delete_not_submitted_outside_pharmacies(
        &self,
        trigger_id: Uuid,
        keep_pharmacy_ids: &[Uuid],
    ) -> AppResult<u64> {
        let result = sqlx::query(OPPORTUNITY_DELETE_NOT_SUBMITTED_OUTSIDE_PHARMACIES)
            .bind(trigger_id)
            .bind(keep_pharmacy_ids)
            .execute(self.database_service.pool())
            .await
            .map_db_error("delete", "opportunity")?;
        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Opportunity>> {
        sqlx::query_as::<_, OpportunityRow>(OPPORTUNITY_FIND_BY_ID)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "opportunity")
            .map(|row| row.map(Opportunity::from))
    }

    async fn update_status(
        &self,
        opportunity_id: Uuid,
        new_status: OpportunityStatus,
        reviewed_at: Option<DateTime<Utc>>,
        actioned_at: Option<DateTime<Utc>>,
    ) -> AppResult<Opportunity> {
        let row = sqlx::query_as::<_, OpportunityRow>(OPPORTUNITY_UPDATE_STATUS)
            .bind(opportunity_id)
            .bind(new_status.as_str())
            .bind(reviewed_at)
            .bind(actioned_at)
            .fetch_one(self.database_service.pool())
            .await
            .map_db_error("update", "opportunity")?;
        Ok(row.into())
    }

    /// §3/§5/§8: refuses deletion — surfaced as `AppError::Constraint` —
    /// once the audit log shows a transition out of `Not Submitted`.
    async fn delete(&self, opportunity_id: Uuid) -> AppResult<()> {
        let protected: bool = sqlx::query_scalar(OPPORTUNITY_AUDIT_LOG_HAS_LEFT_NOT_SUBMITTED)
            .bind(opportunity_id)
            .fetch_one(self.database_service.pool())
            .await
            .map_db_error("fetch", "opportunity_audit_log")?;

        if protected {
            return Err(AppError::Constraint(format!(
                "opportunity {opportunity_id} has left Not Submitted and cannot be deleted"
            )));
        }

        sqlx::query(OPPORTUNITY_DELETE)
            .bind(opportunity_id)
            .execute(self.database_service.pool())
            .await
            .map_db_error("delete", "opportunity")?;
        Ok(())
    }
}
