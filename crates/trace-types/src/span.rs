//! The `Span` record: one hash-linked node of a trace.

use crate::hash::Hash;
use crate::ids::{SpanId, TraceId};
use crate::value::DataValue;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Lifecycle state of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Running,
    Success,
    Failed,
}

/// One node of a trace's hash chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    pub trace_id: TraceId,
    pub parent_id: Option<SpanId>,
    pub name: String,
    pub kind: String,
    /// 0-based, strictly increasing and dense within a trace.
    pub chain_position: u64,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub input_snapshot: DataValue,
    pub output_snapshot: Option<DataValue>,
    pub reasoning: Option<String>,
    /// Confidence in [0, 1]; only meaningful once `status != Running`.
    pub confidence: Option<f64>,
    pub status: SpanStatus,
    pub error_message: Option<String>,
    /// Hex-encoded SHA-256 over `data_snapshot || previous_hash_bytes`.
    pub sha256: Hash,
    /// Hash of the predecessor span in this trace; `ZERO_HASH` at position 0.
    pub previous_hash: Hash,
    /// The exact canonical bytes that were hashed into `sha256`.
    pub data_snapshot: Vec<u8>,
}

impl Span {
    #[must_use]
    pub fn duration(&self) -> Option<std::time::Duration> {
        let end = self.end_time?;
        end.duration_since(self.start_time).ok()
    }
}
