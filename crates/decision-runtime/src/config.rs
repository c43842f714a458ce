//! Environment-variable configuration for the assembled core, following the
//! same `env::var(...).unwrap_or_else(...)` construction style as
//! `decision_telemetry::TelemetryConfig::from_env`.

use anchor_submitter::Network;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// `memory` selects an in-memory trace store; anything else is treated
    /// as a directory path for the file-backed store. Required.
    pub trace_store_dsn: String,

    pub anchor_topic_id: String,
    pub anchor_operator_id: Option<String>,
    pub anchor_operator_key: Option<String>,
    pub anchor_network: Network,
    pub anchor_queue_capacity: usize,
    pub anchor_drain_grace: Duration,

    pub eventbus_broker_url: Option<String>,
    pub eventbus_queue_capacity: usize,
    pub eventbus_publish_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TRACE_STORE_DSN is required")]
    MissingTraceStoreDsn,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let trace_store_dsn =
            env::var("TRACE_STORE_DSN").map_err(|_| ConfigError::MissingTraceStoreDsn)?;

        let anchor_operator_id = env::var("ANCHOR_OPERATOR_ID").ok();
        let anchor_operator_key = env::var("ANCHOR_OPERATOR_KEY").ok();

        let anchor_network = match env::var("ANCHOR_NETWORK").as_deref() {
            Ok("mainnet") => Network::Mainnet,
            _ => Network::Testnet,
        };

        Ok(Self {
            trace_store_dsn,
            anchor_topic_id: env::var("ANCHOR_TOPIC_ID").unwrap_or_else(|_| "default".to_string()),
            anchor_operator_id,
            anchor_operator_key,
            anchor_network,
            anchor_queue_capacity: env::var("ANCHOR_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(anchor_submitter::DEFAULT_QUEUE_CAPACITY),
            anchor_drain_grace: env::var("ANCHOR_DRAIN_GRACE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(anchor_submitter::DEFAULT_DRAIN_GRACE),

            eventbus_broker_url: env::var("EVENTBUS_BROKER_URL").ok(),
            eventbus_queue_capacity: env::var("EVENTBUS_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(event_bus::DEFAULT_QUEUE_CAPACITY),
            eventbus_publish_timeout: env::var("EVENTBUS_PUBLISH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(event_bus::DEFAULT_PUBLISH_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_dsn() {
        // SAFETY: test-only env mutation, no concurrent access to this key in the test binary.
        unsafe {
            env::remove_var("TRACE_STORE_DSN");
        }
        assert!(matches!(
            CoreConfig::from_env(),
            Err(ConfigError::MissingTraceStoreDsn)
        ));
    }

    #[test]
    fn reads_dsn_and_defaults_the_rest() {
        // SAFETY: test-only env mutation, no concurrent access to this key in the test binary.
        unsafe {
            env::set_var("TRACE_STORE_DSN", "memory");
        }
        let config = CoreConfig::from_env().unwrap();
        assert_eq!(config.trace_store_dsn, "memory");
        assert_eq!(config.anchor_network, Network::Testnet);
        assert_eq!(config.eventbus_queue_capacity, event_bus::DEFAULT_QUEUE_CAPACITY);
        // SAFETY: test-only env mutation, no concurrent access to this key in the test binary.
        unsafe {
            env::remove_var("TRACE_STORE_DSN");
        }
    }
}
