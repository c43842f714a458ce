//! Receipts produced by anchoring a trace's Merkle root to an external log.

use crate::hash::Hash;
use crate::ids::TraceId;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorReceipt {
    pub trace_id: TraceId,
    pub merkle_root: Hash,
    pub external_tx_id: String,
    pub sequence_number: u64,
    pub consensus_time: SystemTime,
    pub topic_id: String,
    pub status: AnchorStatus,
    pub verification_url: Option<String>,
    /// Set when this receipt was synthesized by a `MockSubmitter` rather than
    /// a real external log.
    pub mock: bool,
}

/// Queued at `end_trace`, consumed by the Anchor Submitter's background
/// task. The shared shape lets the Tracer enqueue requests without
/// depending on the submitter crate.
#[derive(Debug, Clone, Copy)]
pub struct AnchorRequest {
    pub trace_id: TraceId,
    pub merkle_root: Hash,
}
