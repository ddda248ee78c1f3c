pub mod config;
pub mod formatter;

pub use config::{LogFormat, LoggerConfig};
pub use formatter::{init_default, init_logger};

use crate::config::settings::LoggingConfig;

/// Initialize the logger from application settings.
pub fn init_from_settings(settings: &LoggingConfig) {
    let config = LoggerConfig::from_settings(settings);
    formatter::init_logger(&config);
}
