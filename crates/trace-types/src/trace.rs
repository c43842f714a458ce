//! The `Trace` record: one append-only decision flow.

use crate::hash::Hash;
use crate::ids::TraceId;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Lifecycle state of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    InProgress,
    Completed,
    Failed,
}

/// An append-only record of one decision flow, made up of hash-chained spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub id: TraceId,
    /// Free-form tag, e.g. "trade_execution".
    pub kind: String,
    /// Optional correlation key to an entity outside the core (trade id, order id).
    pub correlation: Option<String>,
    pub status: TraceStatus,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    /// Final outcome label, set at close.
    pub final_outcome: Option<String>,
    /// Final confidence in [0, 1], set at close.
    pub final_confidence: Option<f64>,
    pub anchored: bool,
    /// Merkle root of the ordered span-hash sequence; absent until closed.
    pub merkle_root: Option<Hash>,
}

impl Trace {
    /// Open a new trace in the `in_progress` state.
    #[must_use]
    pub fn open(kind: impl Into<String>, correlation: Option<String>, now: SystemTime) -> Self {
        Self {
            id: TraceId::new(),
            kind: kind.into(),
            correlation,
            status: TraceStatus::InProgress,
            start_time: now,
            end_time: None,
            final_outcome: None,
            final_confidence: None,
            anchored: false,
            merkle_root: None,
        }
    }

    /// Total duration once closed.
    #[must_use]
    pub fn duration(&self) -> Option<std::time::Duration> {
        let end = self.end_time?;
        end.duration_since(self.start_time).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_progress_with_no_end_time() {
        let trace = Trace::open("trade_execution", None, SystemTime::now());
        assert_eq!(trace.status, TraceStatus::InProgress);
        assert!(trace.end_time.is_none());
        assert!(trace.merkle_root.is_none());
    }
}
