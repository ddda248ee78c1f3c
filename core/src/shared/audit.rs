//! Lightweight created/updated timestamp pair shared by every store entity.
//!
//! This core has no authenticated actor concept, so there is no
//! `created_by`/`request_id`/`system_id` to carry here. The richer, append-only
//! audit trail for opportunity status transitions lives in
//! `domain::entities::opportunity_audit_log`, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::new()
    }
}

pub trait HasTimestamps {
    fn timestamps(&self) -> &Timestamps;
    fn timestamps_mut(&mut self) -> &mut Timestamps;

    fn created_at(&self) -> DateTime<Utc> {
        self.timestamps().created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.timestamps().updated_at
    }

    fn touch(&mut self) {
        self.timestamps_mut().touch();
    }
}
