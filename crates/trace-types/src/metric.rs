//! Write-only metrics attached to a trace and optionally a span.
//!
//! Metrics are never hashed into the chain; they exist purely for
//! observability and are append-only.

use crate::ids::{SpanId, TraceId};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub trace_id: TraceId,
    pub span_id: Option<SpanId>,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: SystemTime,
}
