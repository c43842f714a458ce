//! In-memory `TraceStore`, the reference implementation used in tests and
//! by the demo binary. A single `tokio::sync::RwLock` guards the whole map;
//! each trace's record is only ever mutated as a unit, so there is no
//! finer-grained locking to get wrong.

use crate::domain::errors::StoreError;
use crate::ports::outbound::{SpanHashRow, TraceStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::RwLock;
use trace_types::{
    AnchorReceipt, DataValue, Hash, Metric, Span, SpanId, SpanStatus, Trace, TraceId, TraceStatus,
    VerificationKind, VerificationRecord,
};

struct TraceRecord {
    trace: Trace,
    spans: Vec<Span>,
    metrics: Vec<Metric>,
    verifications: Vec<VerificationRecord>,
    anchor: Option<AnchorReceipt>,
}

impl TraceRecord {
    fn new(trace: Trace) -> Self {
        Self {
            trace,
            spans: Vec::new(),
            metrics: Vec::new(),
            verifications: Vec::new(),
            anchor: None,
        }
    }
}

#[derive(Default)]
pub struct InMemoryTraceStore {
    traces: RwLock<HashMap<TraceId, TraceRecord>>,
}

impl InMemoryTraceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TraceStore for InMemoryTraceStore {
    async fn open_trace(
        &self,
        kind: &str,
        correlation: Option<String>,
    ) -> Result<TraceId, StoreError> {
        let trace = Trace::open(kind, correlation, SystemTime::now());
        let id = trace.id;
        let mut traces = self.traces.write().await;
        traces.insert(id, TraceRecord::new(trace));
        Ok(id)
    }

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
    ) -> Result<SpanId, StoreError> {
        let mut traces = self.traces.write().await;
        let record = traces
            .get_mut(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;

        let expected = record.spans.len() as u64;
        if position != expected {
            return Err(StoreError::OrderingViolation {
                trace_id,
                expected,
                got: position,
            });
        }

        let span = Span {
            id: SpanId::new(),
            trace_id,
            parent_id,
            name: name.to_string(),
            kind: kind.to_string(),
            chain_position: position,
            start_time: SystemTime::now(),
            end_time: None,
            input_snapshot,
            output_snapshot: None,
            reasoning: None,
            confidence: None,
            status: SpanStatus::Running,
            error_message: None,
            sha256,
            previous_hash,
            data_snapshot,
        };
        let span_id = span.id;
        record.spans.push(span);
        Ok(span_id)
    }

    async fn finalize_span(
        &self,
        span_id: SpanId,
        output_snapshot: Option<DataValue>,
        reasoning: Option<String>,
        confidence: Option<f64>,
        status: SpanStatus,
        final_sha256: Hash,
        final_data_snapshot: Vec<u8>,
    ) -> Result<(), StoreError> {
        let mut traces = self.traces.write().await;
        for record in traces.values_mut() {
            if let Some(span) = record.spans.iter_mut().find(|s| s.id == span_id) {
                span.output_snapshot = output_snapshot;
                span.reasoning = reasoning;
                span.confidence = confidence;
                span.status = status;
                span.sha256 = final_sha256;
                span.data_snapshot = final_data_snapshot;
                span.end_time = Some(SystemTime::now());
                if status == SpanStatus::Failed && span.error_message.is_none() {
                    span.error_message = span.reasoning.clone();
                }
                return Ok(());
            }
        }
        Err(StoreError::SpanNotFound { span_id })
    }

    async fn close_trace(
        &self,
        trace_id: TraceId,
        final_outcome: Option<String>,
        final_confidence: Option<f64>,
        merkle_root: Hash,
        status: TraceStatus,
    ) -> Result<(), StoreError> {
        let mut traces = self.traces.write().await;
        let record = traces
            .get_mut(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        if record.trace.status != TraceStatus::InProgress {
            return Err(StoreError::AlreadyClosed { trace_id });
        }
        record.trace.end_time = Some(SystemTime::now());
        record.trace.final_outcome = final_outcome;
        record.trace.final_confidence = final_confidence;
        record.trace.merkle_root = Some(merkle_root);
        record.trace.status = status;
        Ok(())
    }

    async fn list_span_hashes(&self, trace_id: TraceId) -> Result<Vec<SpanHashRow>, StoreError> {
        let traces = self.traces.read().await;
        let record = traces
            .get(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        let mut rows: Vec<SpanHashRow> = record
            .spans
            .iter()
            .map(|s| (s.chain_position, s.sha256, s.previous_hash))
            .collect();
        rows.sort_by_key(|(position, _, _)| *position);
        Ok(rows)
    }

    async fn load_trace(&self, trace_id: TraceId) -> Result<(Trace, Vec<Span>), StoreError> {
        let traces = self.traces.read().await;
        let record = traces
            .get(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        let mut spans = record.spans.clone();
        spans.sort_by_key(|s| s.chain_position);
        Ok((record.trace.clone(), spans))
    }

    async fn record_metric(
        &self,
        trace_id: TraceId,
        span_id: Option<SpanId>,
        name: &str,
        value: f64,
        unit: &str,
    ) -> Result<(), StoreError> {
        let mut traces = self.traces.write().await;
        let record = traces
            .get_mut(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        record.metrics.push(Metric {
            trace_id,
            span_id,
            name: name.to_string(),
            value,
            unit: unit.to_string(),
            timestamp: SystemTime::now(),
        });
        Ok(())
    }

    async fn record_verification(
        &self,
        trace_id: TraceId,
        kind: VerificationKind,
        valid: bool,
        error: Option<String>,
        verified_by: &str,
    ) -> Result<(), StoreError> {
        let mut traces = self.traces.write().await;
        let record = traces
            .get_mut(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        record.verifications.push(VerificationRecord {
            trace_id,
            kind,
            valid,
            error,
            verified_by: verified_by.to_string(),
            at: SystemTime::now(),
        });
        Ok(())
    }

    async fn upsert_anchor_receipt(&self, receipt: AnchorReceipt) -> Result<(), StoreError> {
        let mut traces = self.traces.write().await;
        let record = traces
            .get_mut(&receipt.trace_id)
            .ok_or(StoreError::TraceNotFound {
                trace_id: receipt.trace_id,
            })?;
        record.anchor = Some(receipt);
        Ok(())
    }

    async fn mark_anchored(&self, trace_id: TraceId) -> Result<(), StoreError> {
        let mut traces = self.traces.write().await;
        let record = traces
            .get_mut(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        record.trace.anchored = true;
        Ok(())
    }

    async fn list_verifications(
        &self,
        trace_id: TraceId,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        let traces = self.traces.read().await;
        let record = traces
            .get(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        let mut verifications = record.verifications.clone();
        verifications.sort_by_key(|v| std::cmp::Reverse(v.at));
        Ok(verifications)
    }

    async fn list_running_spans(&self, trace_id: TraceId) -> Result<Vec<Span>, StoreError> {
        let traces = self.traces.read().await;
        let record = traces
            .get(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        Ok(record
            .spans
            .iter()
            .filter(|s| s.status == SpanStatus::Running)
            .cloned()
            .collect())
    }
}
