//! File-backed `TraceStore`: one JSON file per trace under a data
//! directory, written atomically via a temp file + rename, mirroring the
//! whole-file rewrite-then-rename discipline used elsewhere in this
//! workspace's storage adapters. Suitable for development and light
//! production; the reference deployment's relational store is external to
//! this crate.

use crate::domain::errors::StoreError;
use crate::ports::outbound::{SpanHashRow, TraceStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::RwLock;
use trace_types::{
    AnchorReceipt, DataValue, Hash, Metric, Span, SpanId, SpanStatus, Trace, TraceId, TraceStatus,
    VerificationKind, VerificationRecord,
};

#[derive(Serialize, Deserialize, Clone)]
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

pub struct FileTraceStore {
    dir: PathBuf,
    cache: RwLock<HashMap<TraceId, TraceRecord>>,
}

impl FileTraceStore {
    /// Open (and, if necessary, create) a trace store rooted at `dir`,
    /// loading any trace files already present.
    pub async fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        let mut cache = HashMap::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            if let Ok(record) = serde_json::from_slice::<TraceRecord>(&bytes) {
                cache.insert(record.trace.id, record);
            } else {
                tracing::warn!(path = %path.display(), "skipping unreadable trace file");
            }
        }
        tracing::info!(dir = %dir.display(), traces = cache.len(), "loaded trace store");
        Ok(Self {
            dir,
            cache: RwLock::new(cache),
        })
    }

    fn path_for(&self, trace_id: TraceId) -> PathBuf {
        self.dir.join(format!("{trace_id}.json"))
    }

    async fn persist(&self, record: &TraceRecord) -> Result<(), StoreError> {
        let path = self.path_for(record.trace.id);
        let bytes = serde_json::to_vec(record).map_err(|e| StoreError::StoreUnavailable {
            message: e.to_string(),
        })?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| StoreError::StoreUnavailable {
                message: e.to_string(),
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StoreError::StoreUnavailable {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl TraceStore for FileTraceStore {
    async fn open_trace(
        &self,
        kind: &str,
        correlation: Option<String>,
    ) -> Result<TraceId, StoreError> {
        let trace = Trace::open(kind, correlation, SystemTime::now());
        let id = trace.id;
        let record = TraceRecord::new(trace);
        self.persist(&record).await?;
        self.cache.write().await.insert(id, record);
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
        let mut cache = self.cache.write().await;
        let record = cache
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
        self.persist(record).await?;
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
        let mut cache = self.cache.write().await;
        for record in cache.values_mut() {
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
                let record = record.clone();
                self.persist(&record).await?;
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
        let mut cache = self.cache.write().await;
        let record = cache
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
        self.persist(record).await?;
        Ok(())
    }

    async fn list_span_hashes(&self, trace_id: TraceId) -> Result<Vec<SpanHashRow>, StoreError> {
        let cache = self.cache.read().await;
        let record = cache
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
        let cache = self.cache.read().await;
        let record = cache
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
        let mut cache = self.cache.write().await;
        let record = cache
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
        self.persist(record).await?;
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
        let mut cache = self.cache.write().await;
        let record = cache
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
        self.persist(record).await?;
        Ok(())
    }

    async fn upsert_anchor_receipt(&self, receipt: AnchorReceipt) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        let record = cache
            .get_mut(&receipt.trace_id)
            .ok_or(StoreError::TraceNotFound {
                trace_id: receipt.trace_id,
            })?;
        record.anchor = Some(receipt);
        self.persist(record).await?;
        Ok(())
    }

    async fn mark_anchored(&self, trace_id: TraceId) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        let record = cache
            .get_mut(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        record.trace.anchored = true;
        self.persist(record).await?;
        Ok(())
    }

    async fn list_verifications(
        &self,
        trace_id: TraceId,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        let cache = self.cache.read().await;
        let record = cache
            .get(&trace_id)
            .ok_or(StoreError::TraceNotFound { trace_id })?;
        let mut verifications = record.verifications.clone();
        verifications.sort_by_key(|v| std::cmp::Reverse(v.at));
        Ok(verifications)
    }

    async fn list_running_spans(&self, trace_id: TraceId) -> Result<Vec<Span>, StoreError> {
        let cache = self.cache.read().await;
        let record = cache
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
