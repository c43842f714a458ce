//! The `TraceStore` capability: the single persistence abstraction the
//! Tracer and Anchor Submitter depend on. Callers hold the per-trace lock
//! that enforces ordering; the store only checks it.

use crate::domain::errors::StoreError;
use async_trait::async_trait;
use trace_types::{
    AnchorReceipt, DataValue, Hash, Metric, SpanId, SpanStatus, Trace, TraceId, TraceStatus,
    VerificationKind, VerificationRecord,
};

/// Ordered `(position, sha256, previous_hash)` triples, as returned by
/// `list_span_hashes`.
pub type SpanHashRow = (u64, Hash, Hash);

#[async_trait]
pub trait TraceStore: Send + Sync {
    /// Insert a trace with status `in_progress`.
    async fn open_trace(
        &self,
        kind: &str,
        correlation: Option<String>,
    ) -> Result<TraceId, StoreError>;

    /// Append a span at `position`. Fails with `OrderingViolation` unless
    /// `position == max_existing_position + 1` for this trace (0 for the
    /// first span). Must be called while the Tracer holds the trace's lock.
    #[allow(clippy::too_many_arguments)]
    async fn append_span(
        &self,
        trace_id: TraceId,
        parent_id: Option<SpanId>,
        name: &str,
        kind: &str,
        input_snapshot: DataValue,
        position: u64,
        previous_hash: Hash,
        sha256: Hash,
        data_snapshot: Vec<u8>,
    ) -> Result<SpanId, StoreError>;

    /// Replace a span's provisional hash and content with final values.
    #[allow(clippy::too_many_arguments)]
    async fn finalize_span(
        &self,
        span_id: SpanId,
        output_snapshot: Option<DataValue>,
        reasoning: Option<String>,
        confidence: Option<f64>,
        status: SpanStatus,
        final_sha256: Hash,
        final_data_snapshot: Vec<u8>,
    ) -> Result<(), StoreError>;

    /// Set end time, duration, merkle root, and status; rejects an
    /// already-closed trace.
    async fn close_trace(
        &self,
        trace_id: TraceId,
        final_outcome: Option<String>,
        final_confidence: Option<f64>,
        merkle_root: Hash,
        status: TraceStatus,
    ) -> Result<(), StoreError>;

    async fn list_span_hashes(&self, trace_id: TraceId) -> Result<Vec<SpanHashRow>, StoreError>;

    /// Load a trace and all of its spans, in position order. Must observe
    /// every write ordered by position.
    async fn load_trace(
        &self,
        trace_id: TraceId,
    ) -> Result<(Trace, Vec<trace_types::Span>), StoreError>;

    async fn record_metric(
        &self,
        trace_id: TraceId,
        span_id: Option<SpanId>,
        name: &str,
        value: f64,
        unit: &str,
    ) -> Result<(), StoreError>;

    async fn record_verification(
        &self,
        trace_id: TraceId,
        kind: VerificationKind,
        valid: bool,
        error: Option<String>,
        verified_by: &str,
    ) -> Result<(), StoreError>;

    async fn upsert_anchor_receipt(&self, receipt: AnchorReceipt) -> Result<(), StoreError>;

    /// Set `Trace.anchored` once a receipt has actually been confirmed.
    /// Separate from `upsert_anchor_receipt` since a failed/abandoned
    /// receipt is still recorded without flipping this flag.
    async fn mark_anchored(&self, trace_id: TraceId) -> Result<(), StoreError>;

    /// Supplemental to the base contract: list every verification recorded
    /// for a trace, most recent first. Used by operators auditing repeated
    /// tamper checks against the same trace.
    async fn list_verifications(
        &self,
        trace_id: TraceId,
    ) -> Result<Vec<VerificationRecord>, StoreError>;

    /// List spans for a trace still in `running` status. Used by the Tracer
    /// to force-finalize unfinished spans on `end_trace` or cancellation.
    async fn list_running_spans(
        &self,
        trace_id: TraceId,
    ) -> Result<Vec<trace_types::Span>, StoreError>;
}
