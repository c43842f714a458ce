//! The public interface through which producers emit traces: opens and
//! closes traces and spans, coordinating span-hashing and trace-store
//! writes. The `TraceStore` is received as an explicit capability (never a
//! global), so the Tracer is generic over it.

mod context;
mod error;

pub use context::Ctx;

use span_hasher::{hash_span, merkle_root, SpanContent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use trace_store::TraceStore;
use trace_types::{
    AnchorRequest, AnchorSink, DataValue, Hash, Span, SpanId, SpanStatus, Trace, TraceError,
    TraceId, TraceStatus, VerificationKind, ZERO_HASH,
};

fn nanos_since_epoch(t: SystemTime) -> i64 {
    t.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

/// Opens/closes traces and spans; coordinates hashing and store writes.
pub struct Tracer<S: TraceStore + ?Sized> {
    store: Arc<S>,
    locks: Mutex<HashMap<TraceId, Arc<Mutex<()>>>>,
    anchor_queue: Option<Arc<dyn AnchorSink>>,
}

impl<S: TraceStore + ?Sized> Tracer<S> {
    /// `anchor_queue` is the Anchor Submitter's enqueue capability; `None`
    /// disables anchoring entirely (e.g. in unit tests that only exercise
    /// hashing).
    pub fn new(store: Arc<S>, anchor_queue: Option<Arc<dyn AnchorSink>>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            anchor_queue,
        }
    }

    async fn trace_lock(&self, trace_id: TraceId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(trace_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Allocate a trace id and its per-trace lock.
    pub async fn start_trace(
        &self,
        _ctx: &Ctx,
        kind: &str,
        correlation: Option<String>,
    ) -> Result<Trace, TraceError> {
        let trace_id = self
            .store
            .open_trace(kind, correlation)
            .await
            .map_err(|e| error::from_store_error(e, None, None))?;
        self.trace_lock(trace_id).await;
        let (trace, _) = self
            .store
            .load_trace(trace_id)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        Ok(trace)
    }

    /// Open a span under `trace`. Position assignment and the provisional
    /// hash are computed under the trace's lock so `chain_position` stays
    /// monotone even with concurrent callers.
    pub async fn start_span(
        &self,
        _ctx: &Ctx,
        trace: &Trace,
        parent: Option<SpanId>,
        name: &str,
        kind: &str,
        input_map: DataValue,
    ) -> Result<Span, TraceError> {
        let trace_id = trace.id;
        let lock = self.trace_lock(trace_id).await;
        let _guard = lock.lock().await;

        let existing = self
            .store
            .list_span_hashes(trace_id)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        let position = existing.len() as u64;
        let previous_hash: Hash = existing
            .iter()
            .max_by_key(|(pos, _, _)| *pos)
            .map(|(_, sha256, _)| *sha256)
            .unwrap_or(ZERO_HASH);

        let start_time = SystemTime::now();
        let input_bytes = span_hasher::encode_data_value(&input_map);
        let content = SpanContent {
            trace_id,
            chain_position: position,
            name,
            kind,
            start_time_nanos: nanos_since_epoch(start_time),
            end_time_nanos: None,
            input_snapshot: &input_bytes,
            output_snapshot: None,
            reasoning: None,
            confidence: None,
            status: SpanStatus::Running,
        };
        let (provisional_sha256, provisional_snapshot) = hash_span(&content, &previous_hash);

        let span_id = self
            .store
            .append_span(
                trace_id,
                parent,
                name,
                kind,
                input_map.clone(),
                position,
                previous_hash,
                provisional_sha256,
                provisional_snapshot,
            )
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        decision_telemetry::SPANS_OPENED.inc();

        Ok(Span {
            id: span_id,
            trace_id,
            parent_id: parent,
            name: name.to_string(),
            kind: kind.to_string(),
            chain_position: position,
            start_time,
            end_time: None,
            input_snapshot: input_map,
            output_snapshot: None,
            reasoning: None,
            confidence: None,
            status: SpanStatus::Running,
            error_message: None,
            sha256: provisional_sha256,
            previous_hash,
            data_snapshot: Vec::new(),
        })
    }

    /// Recompute the final hash from full span content and finalize the
    /// row, replacing both `sha256` and `data_snapshot`.
    pub async fn end_span(
        &self,
        _ctx: &Ctx,
        span: &Span,
        output_map: DataValue,
        reasoning: String,
        confidence: f64,
        status: SpanStatus,
    ) -> Result<Span, TraceError> {
        let end_time = SystemTime::now();
        let input_bytes = span_hasher::encode_data_value(&span.input_snapshot);
        let output_bytes = span_hasher::encode_data_value(&output_map);
        let content = SpanContent {
            trace_id: span.trace_id,
            chain_position: span.chain_position,
            name: &span.name,
            kind: &span.kind,
            start_time_nanos: nanos_since_epoch(span.start_time),
            end_time_nanos: Some(nanos_since_epoch(end_time)),
            input_snapshot: &input_bytes,
            output_snapshot: Some(&output_bytes),
            reasoning: Some(&reasoning),
            confidence: Some(confidence),
            status,
        };
        let (final_sha256, final_snapshot) = hash_span(&content, &span.previous_hash);

        self.store
            .finalize_span(
                span.id,
                Some(output_map.clone()),
                Some(reasoning.clone()),
                Some(confidence),
                status,
                final_sha256,
                final_snapshot.clone(),
            )
            .await
            .map_err(|e| error::from_store_error(e, Some(span.trace_id), Some(span.id)))?;
        decision_telemetry::SPANS_CLOSED.inc();

        Ok(Span {
            end_time: Some(end_time),
            output_snapshot: Some(output_map),
            reasoning: Some(reasoning),
            confidence: Some(confidence),
            status,
            sha256: final_sha256,
            data_snapshot: final_snapshot,
            ..span.clone()
        })
    }

    pub async fn record_metric(
        &self,
        _ctx: &Ctx,
        trace: &Trace,
        span: Option<SpanId>,
        name: &str,
        value: f64,
        unit: &str,
    ) -> Result<(), TraceError> {
        self.store
            .record_metric(trace.id, span, name, value, unit)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace.id), span))
    }

    /// Force-finalize any spans still `running` as `failed`, compute the
    /// Merkle root, close the trace, and enqueue an anchor request
    /// fire-and-forget.
    pub async fn end_trace(
        &self,
        ctx: &Ctx,
        trace: &Trace,
        final_outcome: Option<String>,
        final_confidence: Option<f64>,
    ) -> Result<Trace, TraceError> {
        let trace_id = trace.id;
        self.force_finalize_running_spans(trace_id).await?;

        let hash_rows = self
            .store
            .list_span_hashes(trace_id)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        let mut ordered = hash_rows;
        ordered.sort_by_key(|(position, _, _)| *position);
        let leaves: Vec<Hash> = ordered.into_iter().map(|(_, sha256, _)| sha256).collect();
        let root = merkle_root(&leaves);

        let (_, spans) = self
            .store
            .load_trace(trace_id)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        let any_failed = spans.iter().any(|s| s.status == SpanStatus::Failed);
        let status = if ctx.is_cancelled() || any_failed {
            TraceStatus::Failed
        } else {
            TraceStatus::Completed
        };

        self.store
            .close_trace(trace_id, final_outcome, final_confidence, root, status)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;

        if status == TraceStatus::Completed {
            if let Some(sink) = &self.anchor_queue {
                sink.try_enqueue(AnchorRequest {
                    trace_id,
                    merkle_root: root,
                });
            }
        }

        let (trace, _) = self
            .store
            .load_trace(trace_id)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        Ok(trace)
    }

    async fn force_finalize_running_spans(&self, trace_id: TraceId) -> Result<(), TraceError> {
        let running = self
            .store
            .list_running_spans(trace_id)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        for span in running {
            let reasoning = "trace closed while running".to_string();
            let input_bytes = span_hasher::encode_data_value(&span.input_snapshot);
            let content = SpanContent {
                trace_id,
                chain_position: span.chain_position,
                name: &span.name,
                kind: &span.kind,
                start_time_nanos: nanos_since_epoch(span.start_time),
                end_time_nanos: Some(nanos_since_epoch(SystemTime::now())),
                input_snapshot: &input_bytes,
                output_snapshot: None,
                reasoning: Some(&reasoning),
                confidence: None,
                status: SpanStatus::Failed,
            };
            let (sha256, snapshot) = hash_span(&content, &span.previous_hash);
            self.store
                .finalize_span(
                    span.id,
                    None,
                    Some(reasoning),
                    None,
                    SpanStatus::Failed,
                    sha256,
                    snapshot,
                )
                .await
                .map_err(|e| error::from_store_error(e, Some(trace_id), Some(span.id)))?;
        }
        Ok(())
    }

    /// Load spans, delegate to `verify_chain`, record a `chain_integrity`
    /// verification.
    pub async fn verify_trace(
        &self,
        _ctx: &Ctx,
        trace_id: TraceId,
    ) -> Result<(bool, Option<u64>), TraceError> {
        let (_, spans) = self
            .store
            .load_trace(trace_id)
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        let (valid, first_bad_position) = span_hasher::verify_chain(&spans);

        let error_message = first_bad_position.map(|pos| format!("chain broken at position {pos}"));
        self.store
            .record_verification(
                trace_id,
                VerificationKind::ChainIntegrity,
                valid,
                error_message,
                "tracer",
            )
            .await
            .map_err(|e| error::from_store_error(e, Some(trace_id), None))?;
        decision_telemetry::CHAIN_VERIFICATIONS
            .with_label_values(&[if valid { "valid" } else { "invalid" }])
            .inc();

        Ok((valid, first_bad_position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use trace_store::InMemoryTraceStore;

    fn ctx() -> Ctx {
        Ctx::new()
    }

    async fn tracer() -> Tracer<InMemoryTraceStore> {
        Tracer::new(Arc::new(InMemoryTraceStore::new()), None)
    }

    fn input(symbol: &str, amount: i64) -> DataValue {
        let mut map = BTreeMap::new();
        map.insert("symbol".to_string(), DataValue::from(symbol));
        map.insert("amount".to_string(), DataValue::from(amount));
        DataValue::Map(map)
    }

    #[tokio::test]
    async fn single_span_trade_has_merkle_root_equal_to_its_hash() {
        let tracer = tracer().await;
        let c = ctx();
        let trace = tracer
            .start_trace(&c, "trade_execution", None)
            .await
            .unwrap();
        let span = tracer
            .start_span(&c, &trace, None, "execute", "trade", input("SOL/USDC", 10))
            .await
            .unwrap();
        assert_eq!(span.chain_position, 0);
        assert_eq!(span.previous_hash, ZERO_HASH);

        let mut output = BTreeMap::new();
        output.insert("price".to_string(), DataValue::from(150.0));
        output.insert("fee".to_string(), DataValue::from(1.5));
        let finished = tracer
            .end_span(
                &c,
                &span,
                DataValue::Map(output),
                "test".to_string(),
                0.9,
                SpanStatus::Success,
            )
            .await
            .unwrap();

        let closed = tracer
            .end_trace(
                &c,
                &trace,
                Some("trade_executed_successfully".to_string()),
                Some(0.92),
            )
            .await
            .unwrap();

        assert_eq!(closed.status, TraceStatus::Completed);
        assert_eq!(closed.merkle_root, Some(finished.sha256));
    }

    #[tokio::test]
    async fn six_span_pipeline_verifies() {
        let tracer = tracer().await;
        let c = ctx();
        let trace = tracer
            .start_trace(&c, "trade_execution", None)
            .await
            .unwrap();

        let names = [
            "authorization_check",
            "input_validation",
            "market_pricing",
            "balance_check",
            "trade_execution",
            "database_persistence",
        ];
        for name in names {
            let span = tracer
                .start_span(&c, &trace, None, name, "step", DataValue::Null)
                .await
                .unwrap();
            tracer
                .end_span(
                    &c,
                    &span,
                    DataValue::Null,
                    "ok".to_string(),
                    1.0,
                    SpanStatus::Success,
                )
                .await
                .unwrap();
        }

        tracer
            .end_trace(&c, &trace, Some("done".to_string()), Some(1.0))
            .await
            .unwrap();

        let (valid, first_bad) = tracer.verify_trace(&c, trace.id).await.unwrap();
        assert!(valid);
        assert_eq!(first_bad, None);
    }

    #[tokio::test]
    async fn end_trace_force_finalizes_running_spans() {
        let tracer = tracer().await;
        let c = ctx();
        let trace = tracer
            .start_trace(&c, "trade_execution", None)
            .await
            .unwrap();
        tracer
            .start_span(&c, &trace, None, "pending_step", "step", DataValue::Null)
            .await
            .unwrap();

        let closed = tracer.end_trace(&c, &trace, None, None).await.unwrap();
        assert_eq!(closed.status, TraceStatus::Failed);

        let (_, spans) = tracer
            .store
            .load_trace(trace.id)
            .await
            .unwrap();
        assert!(spans.iter().all(|s| s.status != SpanStatus::Running));
    }
}
