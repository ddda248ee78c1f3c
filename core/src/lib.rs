//! `rxscan-core` — claims ingestion, trigger evaluation, and coverage
//! scanning for pharmacy opportunity detection.
//!
//! `domain` holds entities and repository traits, `infrastructure` holds
//! the sqlx-backed implementations plus logging, `application` holds the
//! three scanning services (`Ingestor`, `TriggerEvaluator`,
//! `CoverageScanner`), and `shared`/`config` carry the cross-cutting
//! error and settings types.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

#[cfg(test)]
pub mod testing;
