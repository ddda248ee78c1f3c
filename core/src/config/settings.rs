use serde::{Deserialize, Serialize};
use std::env;

use crate::shared::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub scan: ScanDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub rust_log: String,
}

/// Default thresholds for the evaluator and coverage scanner (§4.2, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanDefaults {
    pub lookback_days: i64,
    pub min_claims: i64,
    pub days_back: i64,
    pub min_margin_cents: i64,
    pub dme_min_margin_cents: i64,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            min_claims: 1,
            days_back: 365,
            min_margin_cents: 1000,
            dme_min_margin_cents: 300,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Configuration("DATABASE_URL must be set".to_string()))?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        let scan = ScanDefaults {
            lookback_days: env_i64("SCAN_LOOKBACK_DAYS", ScanDefaults::default().lookback_days),
            min_claims: env_i64("SCAN_MIN_CLAIMS", ScanDefaults::default().min_claims),
            days_back: env_i64("SCAN_DAYS_BACK", ScanDefaults::default().days_back),
            min_margin_cents: env_i64(
                "SCAN_MIN_MARGIN_CENTS",
                ScanDefaults::default().min_margin_cents,
            ),
            dme_min_margin_cents: env_i64(
                "SCAN_DME_MIN_MARGIN_CENTS",
                ScanDefaults::default().dme_min_margin_cents,
            ),
        };

        Ok(Settings {
            database,
            logging,
            scan,
        })
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
