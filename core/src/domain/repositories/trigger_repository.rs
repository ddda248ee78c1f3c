//! Trigger repository trait (§3, §4.2, §4.3, §6 "triggers" table).

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::Trigger;
use crate::shared::AppResult;

#[async_trait]
pub trait TriggerRepository: Send + Sync {
    /// Enabled triggers in ascending priority order (§4.2 "Ordering &
    /// tie-breaks"), already filtered by `pharmacy_inclusions` for the
    /// given pharmacy.
    async fn find_enabled_for_pharmacy(&self, pharmacy_id: Uuid) -> AppResult<Vec<Trigger>>;

    /// Every enabled trigger, for the process-wide coverage scan (§4.3,
    /// §5 "one process-wide instance").
    async fn find_all_enabled(&self) -> AppResult<Vec<Trigger>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trigger>>;

    /// §4.3 step 3: median of per-(bin,group) mean GPs, plus `synced_at`.
    async fn update_default_gp_value(
        &self,
        trigger_id: Uuid,
        default_gp_value: BigDecimal,
        synced_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// §4.3 step 5: disable a trigger with zero verified rows so it
    /// surfaces for manual review.
    async fn disable(&self, trigger_id: Uuid) -> AppResult<()>;
}
