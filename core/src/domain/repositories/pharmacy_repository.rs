//! Pharmacy repository trait (§3, §6 "pharmacies" table).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Pharmacy;
use crate::shared::AppResult;

#[async_trait]
pub trait PharmacyRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Pharmacy>>;

    /// Coverage scan is process-wide (§5); it needs every tenant's
    /// `excluded_bins` setting when resolving BIN scope for back-propagation.
    async fn list_all(&self) -> AppResult<Vec<Pharmacy>>;
}
