//! Prometheus metrics for the decision core. Naming follows the teacher's
//! `<subsystem>_<metric>_<unit>` convention (`decision_<component>_<metric>`).

use crate::TelemetryError;
use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref SPANS_OPENED: Counter = Counter::new(
        "decision_tracer_spans_opened_total",
        "Total spans opened across all traces"
    ).expect("metric creation failed");

    pub static ref SPANS_CLOSED: Counter = Counter::new(
        "decision_tracer_spans_closed_total",
        "Total spans finalized across all traces"
    ).expect("metric creation failed");

    pub static ref CHAIN_VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("decision_tracer_chain_verifications_total", "Chain integrity verifications"),
        &["outcome"] // valid/invalid
    ).expect("metric creation failed");

    pub static ref ANCHOR_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("decision_anchor_submissions_total", "Anchor submission attempts"),
        &["outcome"] // success/transient_fail/permanent_fail
    ).expect("metric creation failed");

    pub static ref EVENTBUS_PUBLISHES: Counter = Counter::new(
        "decision_eventbus_publishes_total",
        "Total publish calls on the event bus"
    ).expect("metric creation failed");

    pub static ref EVENTBUS_DROPS: CounterVec = CounterVec::new(
        Opts::new("decision_eventbus_drops_total", "Per-subscriber message drops"),
        &["reason"] // timeout/closed/queue_full
    ).expect("metric creation failed");

    pub static ref EVENTBUS_QUEUE_DEPTH: Gauge = Gauge::new(
        "decision_eventbus_queue_depth",
        "Most recently observed subscriber queue depth"
    ).expect("metric creation failed");
}

pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SPANS_OPENED.clone()),
        Box::new(SPANS_CLOSED.clone()),
        Box::new(CHAIN_VERIFICATIONS.clone()),
        Box::new(ANCHOR_SUBMISSIONS.clone()),
        Box::new(EVENTBUS_PUBLISHES.clone()),
        Box::new(EVENTBUS_DROPS.clone()),
        Box::new(EVENTBUS_QUEUE_DEPTH.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all registered metrics as Prometheus text format, for an
/// operator-supplied `/metrics` HTTP endpoint (outside this crate's scope).
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        SPANS_OPENED.inc();
        assert!(SPANS_OPENED.get() >= 1.0);
    }

    #[test]
    fn queue_depth_gauge_is_settable() {
        EVENTBUS_QUEUE_DEPTH.set(42.0);
        assert_eq!(EVENTBUS_QUEUE_DEPTH.get(), 42.0);
    }

    #[test]
    fn encode_metrics_produces_prometheus_text() {
        let _ = register_metrics();
        SPANS_OPENED.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("decision_tracer_spans_opened_total"));
    }
}
