//! Background loop that drains the anchor request queue, submits each
//! request with retry, and records the outcome.

use crate::backoff::{delay_for_attempt, MAX_ATTEMPTS};
use crate::error::SubmitError;
use crate::submitter::Submitter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use trace_store::TraceStore;
use trace_types::{AnchorReceipt, AnchorRequest, AnchorStatus, VerificationKind};

/// Result of a graceful shutdown: how many queued requests were drained
/// before the grace period elapsed, and how many were abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub drained: usize,
    pub abandoned: usize,
}

pub async fn run<S, T>(
    store: Arc<S>,
    submitter: Arc<T>,
    mut receiver: mpsc::Receiver<AnchorRequest>,
    cancel: CancellationToken,
    grace: Duration,
) -> ShutdownReport
where
    S: TraceStore + ?Sized + 'static,
    T: Submitter + 'static,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return drain_on_shutdown(&store, &submitter, &mut receiver, grace).await;
            }
            request = receiver.recv() => {
                match request {
                    Some(request) => process_one(&store, &submitter, request).await,
                    None => return ShutdownReport::default(),
                }
            }
        }
    }
}

/// Keep submitting queued requests for up to `grace`, then abandon
/// whatever is still waiting.
async fn drain_on_shutdown<S, T>(
    store: &Arc<S>,
    submitter: &Arc<T>,
    receiver: &mut mpsc::Receiver<AnchorRequest>,
    grace: Duration,
) -> ShutdownReport
where
    S: TraceStore + ?Sized + 'static,
    T: Submitter + 'static,
{
    let mut report = ShutdownReport::default();
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, receiver.recv()).await {
            Ok(Some(request)) => {
                process_one(store, submitter, request).await;
                report.drained += 1;
            }
            Ok(None) => return report,
            Err(_elapsed) => break,
        }
    }
    while let Ok(request) = receiver.try_recv() {
        abandon(store, request).await;
        report.abandoned += 1;
    }
    report
}

async fn abandon<S: TraceStore + ?Sized>(store: &Arc<S>, request: AnchorRequest) {
    let receipt = AnchorReceipt {
        trace_id: request.trace_id,
        merkle_root: request.merkle_root,
        external_tx_id: String::new(),
        sequence_number: 0,
        consensus_time: std::time::SystemTime::now(),
        topic_id: String::new(),
        status: AnchorStatus::Failed,
        verification_url: None,
        mock: false,
    };
    if let Err(e) = store.upsert_anchor_receipt(receipt).await {
        tracing::warn!(trace_id = %request.trace_id, error = %e, "failed to record abandoned anchor receipt");
    }
}

async fn process_one<S, T>(store: &Arc<S>, submitter: &Arc<T>, request: AnchorRequest)
where
    S: TraceStore + ?Sized,
    T: Submitter,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match submitter.submit(request.merkle_root).await {
            Ok(result) => {
                let receipt = AnchorReceipt {
                    trace_id: request.trace_id,
                    merkle_root: request.merkle_root,
                    external_tx_id: result.external_tx_id,
                    sequence_number: result.sequence_number,
                    consensus_time: result.consensus_time,
                    topic_id: result.topic_id,
                    status: AnchorStatus::Confirmed,
                    verification_url: None,
                    mock: submitter.is_mock(),
                };
                if let Err(e) = store.upsert_anchor_receipt(receipt).await {
                    tracing::warn!(trace_id = %request.trace_id, error = %e, "failed to persist anchor receipt");
                }
                if let Err(e) = store.mark_anchored(request.trace_id).await {
                    tracing::warn!(trace_id = %request.trace_id, error = %e, "failed to mark trace anchored");
                }
                decision_telemetry::ANCHOR_SUBMISSIONS.with_label_values(&["success"]).inc();
                return;
            }
            Err(SubmitError::Permanent(message)) => {
                decision_telemetry::ANCHOR_SUBMISSIONS.with_label_values(&["permanent_fail"]).inc();
                record_failure(store, request, message).await;
                return;
            }
            Err(SubmitError::Transient(message)) => {
                if attempt >= MAX_ATTEMPTS {
                    decision_telemetry::ANCHOR_SUBMISSIONS.with_label_values(&["transient_fail"]).inc();
                    record_failure(store, request, message).await;
                    return;
                }
                tokio::time::sleep(delay_for_attempt(attempt)).await;
            }
        }
    }
}

async fn record_failure<S: TraceStore + ?Sized>(store: &Arc<S>, request: AnchorRequest, message: String) {
    let receipt = AnchorReceipt {
        trace_id: request.trace_id,
        merkle_root: request.merkle_root,
        external_tx_id: String::new(),
        sequence_number: 0,
        consensus_time: std::time::SystemTime::now(),
        topic_id: String::new(),
        status: AnchorStatus::Failed,
        verification_url: None,
        mock: false,
    };
    if let Err(e) = store.upsert_anchor_receipt(receipt).await {
        tracing::warn!(trace_id = %request.trace_id, error = %e, "failed to persist failed anchor receipt");
    }
    if let Err(e) = store
        .record_verification(
            request.trace_id,
            VerificationKind::AnchorMatch,
            false,
            Some(message),
            "anchor_submitter",
        )
        .await
    {
        tracing::warn!(trace_id = %request.trace_id, error = %e, "failed to record anchor_match verification");
    }
}

/// How long `shutdown` waits for the drain path to run before forcing
/// abandonment of anything left in the queue.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(5);
