//! Application layer: the three scanning services described in §4 plus the
//! pure-logic helpers they share. Each service is a thin async shell
//! (fetch via repository traits, delegate to free functions, persist) so
//! the matching/aggregation/economics rules stay unit-testable without a
//! database.

pub mod coverage_scanner;
pub mod economics;
pub mod gp_cache;
pub mod ingestor;
pub mod keywords;
pub mod trigger_evaluator;

pub use coverage_scanner::{CoverageScanParams, CoverageScanner};
pub use ingestor::Ingestor;
pub use trigger_evaluator::TriggerEvaluator;
