//! Postgres-backed `TriggerRepository` (§3, §4.2, §4.3, §6 "triggers" table).

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{KeywordMatchMode, Trigger, TriggerType};
use crate::domain::repositories::TriggerRepository;
use crate::infrastructure::database::queries::triggers::{
    TRIGGER_DISABLE, TRIGGER_FIND_ALL_ENABLED, TRIGGER_FIND_BY_ID, TRIGGER_FIND_ENABLED_FOR_PHARMACY,
    TRIGGER_UPDATE_DEFAULT_GP_VALUE,
};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

#[derive(Debug, FromRow)]
struct TriggerRow {
    id: Uuid,
    code: String,
    display_name: String,
    trigger_type: String,
    category: String,
    enabled: bool,
    priority: i32,
    detection_keywords: Vec<String>,
    exclude_keywords: Vec<String>,
    if_has_keywords: Vec<String>,
    if_not_has_keywords: Vec<String>,
    keyword_match_mode: String,
    expected_qty: Option<BigDecimal>,
    expected_days_supply: Option<i32>,
    recommended_drug: Option<String>,
    recommended_ndc: Option<String>,
    pharmacy_inclusions: Vec<Uuid>,
    bin_inclusions: Vec<String>,
    bin_exclusions: Vec<String>,
    group_inclusions: Vec<String>,
    group_exclusions: Vec<String>,
    contract_prefix_exclusions: Vec<String>,
    annual_fills: i32,
    default_gp_value: BigDecimal,
    min_margin_default: BigDecimal,
    clinical_rationale: Option<String>,
    action_instructions: Option<String>,
    synced_at: Option<DateTime<Utc>>,
}

impl From<TriggerRow> for Trigger {
    fn from(row: TriggerRow) -> Self {
        let trigger_type = match row.trigger_type.as_str() {
            "therapeutic_interchange" => TriggerType::TherapeuticInterchange,
            "missing_therapy" => TriggerType::MissingTherapy,
            "ndc_optimization" => TriggerType::NdcOptimization,
            // §9 Open Questions: `combo` and any unrecognized value are
            // treated as a synonym of `therapeutic_interchange`.
            _ => TriggerType::Combo,
        };
        let keyword_match_mode = match row.keyword_match_mode.as_str() {
            "all" => KeywordMatchMode::All,
            _ => KeywordMatchMode::Any,
        };
        Trigger {
            id: row.id,
            code: row.code,
            display_name: row.display_name,
            trigger_type,
            category: row.category,
            enabled: row.enabled,
            priority: row.priority,
            detection_keywords: row.detection_keywords.into_iter().collect(),
            exclude_keywords: row.exclude_keywords.into_iter().collect(),
            if_has_keywords: row.if_has_keywords.into_iter().collect(),
            if_not_has_keywords: row.if_not_has_keywords.into_iter().collect(),
            keyword_match_mode,
            expected_qty: row.expected_qty,
            expected_days_supply: row.expected_days_supply,
            recommended_drug: row.recommended_drug,
            recommended_ndc: row.recommended_ndc,
            pharmacy_inclusions: row.pharmacy_inclusions.into_iter().collect(),
            bin_inclusions: row.bin_inclusions.into_iter().collect(),
            bin_exclusions: row.bin_exclusions.into_iter().collect(),
            group_inclusions: row.group_inclusions.into_iter().collect(),
            group_exclusions: row.group_exclusions.into_iter().collect(),
            contract_prefix_exclusions: row.contract_prefix_exclusions,
            annual_fills: row.annual_fills,
            default_gp_value: row.default_gp_value,
            min_margin_default: row.min_margin_default,
            clinical_rationale: row.clinical_rationale,
            action_instructions: row.action_instructions,
            synced_at: row.synced_at,
        }
    }
}

pub struct TriggerRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl TriggerRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl TriggerRepository for TriggerRepositoryImpl {
    async fn find_enabled_for_pharmacy(&self, pharmacy_id: Uuid) -> AppResult<Vec<Trigger>> {
        sqlx::query_as::<_, TriggerRow>(TRIGGER_FIND_ENABLED_FOR_PHARMACY)
            .bind(pharmacy_id)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger")
            .map(|rows| rows.into_iter().map(Trigger::from).collect())
    }

    async fn find_all_enabled(&self) -> AppResult<Vec<Trigger>> {
        sqlx::query_as::<_, TriggerRow>(TRIGGER_FIND_ALL_ENABLED)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger")
            .map(|rows| rows.into_iter().map(Trigger::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trigger>> {
        sqlx::query_as::<_, TriggerRow>(TRIGGER_FIND_BY_ID)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "trigger")
            .map(|row| row.map(Trigger::from))
    }

    async fn update_default_gp_value(&self, trigger_id: Uuid, default_gp_value: BigDecimal, synced_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(TRIGGER_UPDATE_DEFAULT_GP_VALUE)
            .bind(trigger_id)
            .bind(default_gp_value)
            .bind(synced_at)
            .execute(self.database_service.pool())
            .await
            .map_db_error("update", "trigger")?;
        Ok(())
    }

    async fn disable(&self, trigger_id: Uuid) -> AppResult<()> {
        sqlx::query(TRIGGER_DISABLE)
            .bind(trigger_id)
            .execute(self.database_service.pool())
            .await
            .map_db_error("update", "trigger")?;
        Ok(())
    }
}
