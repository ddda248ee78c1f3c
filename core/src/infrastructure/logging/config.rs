use std::env;
use tracing::Level;

use crate::config::settings::LoggingConfig;

/// Logger configuration builder, trimmed from the teacher's
/// deployment-aware version: this core runs as a single-environment batch
/// job, so there is no dev/staging/production split to thread through.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: String,
    pub rust_log: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LoggerConfig {
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        let format = match env::var("LOG_FORMAT").unwrap_or_default().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            level: if settings.level.is_empty() {
                "info".to_string()
            } else {
                settings.level.clone()
            },
            rust_log: if settings.rust_log.is_empty() {
                "info".to_string()
            } else {
                settings.rust_log.clone()
            },
            format,
        }
    }

    pub fn parse_level(level: &str) -> Level {
        match level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}
