//! Batches completed traces, submits Merkle roots to an external immutable
//! log via a pluggable `Submitter`, and records receipts.

mod backoff;
mod error;
mod submitter;
mod worker;

pub use error::{AnchorError, SubmitError};
pub use submitter::{MockSubmitter, Network, SubmitResult, Submitter, SubmitterConfig};
pub use worker::{ShutdownReport, DEFAULT_DRAIN_GRACE};

use span_hasher::merkle_root;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use trace_store::TraceStore;
use trace_types::{AnchorRequest, AnchorSink, TraceId, VerificationKind};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Owns the bounded anchor-request queue and the background task that
/// drains it. Construct with [`AnchorSubmitter::spawn`]; obtain the
/// [`AnchorSink`] handle for the Tracer with [`AnchorSubmitter::sink`].
pub struct AnchorSubmitter<S: TraceStore + ?Sized, T: Submitter> {
    store: Arc<S>,
    sender: mpsc::Sender<AnchorRequest>,
    cancel: CancellationToken,
    _submitter: std::marker::PhantomData<T>,
}

impl<S, T> AnchorSubmitter<S, T>
where
    S: TraceStore + ?Sized + 'static,
    T: Submitter + 'static,
{
    /// Spawn the background drain task, returning the submitter handle and
    /// its task's join handle (resolves to a `ShutdownReport` once the
    /// worker stops).
    pub fn spawn(
        store: Arc<S>,
        submitter: Arc<T>,
        queue_capacity: usize,
        grace: Duration,
    ) -> (Arc<Self>, JoinHandle<ShutdownReport>) {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let cancel = CancellationToken::new();
        let this = Arc::new(Self {
            store: store.clone(),
            sender,
            cancel: cancel.clone(),
            _submitter: std::marker::PhantomData,
        });
        let handle = tokio::spawn(worker::run(store, submitter, receiver, cancel, grace));
        (this, handle)
    }

    /// The capability handed to the Tracer so it can enqueue anchor
    /// requests without depending on this crate.
    #[must_use]
    pub fn sink(self: &Arc<Self>) -> Arc<dyn AnchorSink> {
        self.clone()
    }

    /// Signal the background task to drain up to its configured grace
    /// period, then abandon whatever remains.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Reload the trace, recompute its Merkle root, compare to the stored
    /// receipt, and record an `anchor_match` verification. Independently
    /// callable outside the submission flow.
    pub async fn verify_against_anchor(&self, trace_id: TraceId) -> Result<bool, AnchorError> {
        let (trace, spans) = self.store.load_trace(trace_id).await?;
        let leaves = spans.iter().map(|s| s.sha256).collect::<Vec<_>>();
        let recomputed = merkle_root(&leaves);
        let valid = trace.merkle_root == Some(recomputed);
        let error = if valid {
            None
        } else {
            Some("recomputed merkle root does not match stored trace root".to_string())
        };
        self.store
            .record_verification(trace_id, VerificationKind::AnchorMatch, valid, error, "anchor_submitter")
            .await?;
        Ok(valid)
    }
}

impl<S, T> AnchorSink for AnchorSubmitter<S, T>
where
    S: TraceStore + ?Sized + 'static,
    T: Submitter + 'static,
{
    fn try_enqueue(&self, request: AnchorRequest) {
        if let Err(mpsc::error::TrySendError::Full(request)) = self.sender.try_send(request) {
            let store = self.store.clone();
            let trace_id = request.trace_id;
            tokio::spawn(async move {
                if let Err(e) = store
                    .record_verification(
                        trace_id,
                        VerificationKind::AnchorMatch,
                        false,
                        Some("queue full".to_string()),
                        "anchor_submitter",
                    )
                    .await
                {
                    tracing::warn!(%trace_id, error = %e, "failed to record queue-full verification");
                }
            });
            tracing::warn!(%trace_id, "anchor queue full, request dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_store::InMemoryTraceStore;
    use trace_types::{Hash, TraceStatus};

    async fn open_and_close_trace(store: &InMemoryTraceStore) -> (TraceId, Hash) {
        let trace_id = store.open_trace("trade_decision", None).await.unwrap();
        let root = [7u8; 32];
        store
            .close_trace(trace_id, None, None, root, TraceStatus::Completed)
            .await
            .unwrap();
        (trace_id, root)
    }

    #[tokio::test]
    async fn submitted_request_is_confirmed_and_receipted() {
        let store = Arc::new(InMemoryTraceStore::new());
        let submitter = Arc::new(MockSubmitter::new("topic-1"));
        let (anchor, handle) =
            AnchorSubmitter::spawn(store.clone(), submitter, 16, Duration::from_secs(1));
        let (trace_id, root) = open_and_close_trace(&store).await;

        anchor.try_enqueue(AnchorRequest {
            trace_id,
            merkle_root: root,
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (trace, _) = store.load_trace(trace_id).await.unwrap();
        assert_eq!(trace.merkle_root, Some(root));

        anchor.shutdown();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn full_queue_records_a_failed_verification_instead_of_blocking() {
        let store = Arc::new(InMemoryTraceStore::new());
        let submitter = Arc::new(MockSubmitter::new("topic-1"));
        let (anchor, handle) =
            AnchorSubmitter::spawn(store.clone(), submitter, 0, Duration::from_millis(50));
        let (trace_id, root) = open_and_close_trace(&store).await;

        anchor.try_enqueue(AnchorRequest {
            trace_id,
            merkle_root: root,
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let verifications = store.list_verifications(trace_id).await.unwrap();
        assert!(verifications
            .iter()
            .any(|v| v.kind == trace_types::VerificationKind::AnchorMatch && !v.valid));

        anchor.shutdown();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn verify_against_anchor_matches_a_real_trace() {
        use trace_types::DataValue;

        let store = Arc::new(InMemoryTraceStore::new());
        let t = tracer::Tracer::new(store.clone(), None);
        let ctx = tracer::Ctx::new();
        let trace = t.start_trace(&ctx, "trade_execution", None).await.unwrap();
        let span = t
            .start_span(&ctx, &trace, None, "execute", "trade", DataValue::Null)
            .await
            .unwrap();
        t.end_span(
            &ctx,
            &span,
            DataValue::Null,
            "ok".to_string(),
            1.0,
            trace_types::SpanStatus::Success,
        )
        .await
        .unwrap();
        let closed = t.end_trace(&ctx, &trace, None, None).await.unwrap();
        let root = closed.merkle_root.unwrap();

        let submitter = Arc::new(MockSubmitter::new("topic-1"));
        let (anchor, handle) =
            AnchorSubmitter::spawn(store.clone(), submitter, 16, Duration::from_secs(1));
        anchor.try_enqueue(AnchorRequest {
            trace_id: trace.id,
            merkle_root: root,
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let valid = anchor.verify_against_anchor(trace.id).await.unwrap();
        assert!(valid);

        anchor.shutdown();
        let _ = handle.await;
    }
}
