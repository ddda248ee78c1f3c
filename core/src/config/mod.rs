pub mod settings;

pub use settings::{DatabaseConfig, LoggingConfig, ScanDefaults, Settings};
