//! Structured logging and Prometheus metrics for the decision core,
//! trimmed from the teacher's LGTM-stack telemetry crate down to what this
//! system needs: no OpenTelemetry/Loki exporters, since those backends are
//! external collaborators here, but the same env-var-driven configuration
//! shape.

mod config;
mod error;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use error::TelemetryError;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ANCHOR_SUBMISSIONS, CHAIN_VERIFICATIONS,
    EVENTBUS_DROPS, EVENTBUS_PUBLISHES, EVENTBUS_QUEUE_DEPTH, SPANS_CLOSED, SPANS_OPENED,
};

/// Initialize logging and metrics together. Returns the metrics handle,
/// which must be kept alive for the registry's collectors to stay
/// registered.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<MetricsHandle, TelemetryError> {
    logging::init_logging(config)?;
    metrics::register_metrics()
}
