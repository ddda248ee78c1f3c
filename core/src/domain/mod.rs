//! Domain layer: entities, repository traits, and the opportunity state
//! machine (§3, §4, §9). No module here talks to the database directly —
//! see `infrastructure::repositories` for the sqlx-backed implementations.

pub mod entities;
pub mod repositories;
pub mod state_machine;
