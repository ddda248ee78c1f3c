//! TriggerBinValue repository trait (§3, §4.3, §5, §6).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::TriggerBinValue;
use crate::shared::AppResult;

#[async_trait]
pub trait TriggerBinValueRepository: Send + Sync {
    /// Delete non-excluded rows for `trigger_id` (`is_excluded = false OR
    /// is_excluded IS NULL`, §5 "shared-resource policy") and upsert the
    /// survivors from this scan, as a single transaction (§5 "atomic per
    /// trigger").
    async fn replace_verified_for_trigger(
        &self,
        trigger_id: Uuid,
        rows: &[TriggerBinValue],
    ) -> AppResult<()>;

    /// Matching row for a fill's (BIN, group) used by back-propagation
    /// (§4.3 step 4 "by BIN+group, non-excluded"); `is_excluded=true` rows
    /// never come back here.
    async fn find_match(
        &self,
        trigger_id: Uuid,
        bin: &str,
        group: Option<&str>,
    ) -> AppResult<Option<TriggerBinValue>>;

    /// Matching row for a fill's (BIN, group) used by the evaluator (§4.2
    /// step 4a). Unlike `find_match`, this returns `is_excluded=true` rows
    /// too, so the evaluator can honor §4.2 step 4's "if the matched
    /// TriggerBinValue has is_excluded = true, skip."
    async fn find_match_including_excluded(
        &self,
        trigger_id: Uuid,
        bin: &str,
        group: Option<&str>,
    ) -> AppResult<Option<TriggerBinValue>>;

    async fn find_verified_for_trigger(&self, trigger_id: Uuid) -> AppResult<Vec<TriggerBinValue>>;
}
