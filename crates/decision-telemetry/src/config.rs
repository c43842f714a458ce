//! Telemetry configuration from environment variables. Trimmed from the
//! LGTM-stack shape this is grounded on: no OTLP/Loki endpoints, since those
//! backends are genuinely external collaborators here, but the env-var-driven
//! construction and defaulting style is kept as-is.

use std::env;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "decision-core".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// Reads `DECISION_LOG_LEVEL` (falling back to `RUST_LOG`), `DECISION_JSON_LOGS`,
    /// and `DECISION_METRICS_PORT`.
    #[must_use]
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("DECISION_SERVICE_NAME")
                .unwrap_or_else(|_| "decision-core".to_string()),

            log_level: env::var("DECISION_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("DECISION_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("DECISION_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "decision-core");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.metrics_port, 9100);
    }
}
