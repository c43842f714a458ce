//! Maps store-level errors onto the cross-component `TraceError` shape.

use trace_store::StoreError;
use trace_types::{ErrorKind, SpanId, TraceError, TraceId};

pub fn from_store_error(
    err: StoreError,
    trace_id: Option<TraceId>,
    span_id: Option<SpanId>,
) -> TraceError {
    let kind = match &err {
        StoreError::OrderingViolation { .. } => ErrorKind::OrderingViolation,
        StoreError::AlreadyClosed { .. } => ErrorKind::AlreadyClosed,
        StoreError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
        StoreError::TraceNotFound { .. } | StoreError::SpanNotFound { .. } => ErrorKind::NotFound,
    };
    let mut trace_err = TraceError::new(kind, err.to_string());
    if let Some(trace_id) = trace_id {
        trace_err = trace_err.with_trace(trace_id);
    }
    if let Some(span_id) = span_id {
        trace_err = trace_err.with_span(span_id);
    }
    trace_err
}
