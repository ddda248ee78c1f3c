//! IngestionLog repository trait (§4.1, §6, §7).

use async_trait::async_trait;

use crate::domain::entities::IngestionLog;
use crate::shared::AppResult;

#[async_trait]
pub trait IngestionLogRepository: Send + Sync {
    async fn create(&self, log: IngestionLog) -> AppResult<IngestionLog>;
}
