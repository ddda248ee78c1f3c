use tracing_subscriber::{fmt, EnvFilter};

use super::config::{LogFormat, LoggerConfig};

/// Install the global tracing subscriber. Called once per binary entry
/// point (the CLI's `main`), mirroring the teacher's
/// `infrastructure::logging::init_from_settings`.
pub fn init_logger(config: &LoggerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone()));

    let builder = fmt().with_env_filter(filter).with_target(true);

    match config.format {
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
        LogFormat::Pretty => {
            let _ = builder.try_init();
        }
    }
}

pub fn init_default() {
    init_logger(&LoggerConfig {
        level: "info".to_string(),
        rust_log: "info".to_string(),
        format: LogFormat::Pretty,
    });
}
