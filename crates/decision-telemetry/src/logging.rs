//! Installs the process-wide `tracing` subscriber. Separate from
//! `register_metrics` so a binary can initialize logging before it has
//! decided whether metrics are wanted at all.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::EnvFilter;

pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);

    let result = if config.json_logs {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(service = %config.service_name, "logging initialized");
    Ok(())
}
