//! Errors surfaced by the trace store's operations.
//!
//! Each variant maps to one of the kinds named in the error handling design:
//! ordering violations are fatal to the offending span but not the trace,
//! `AlreadyClosed` and `NotFound` are returned to the caller unchanged, and
//! `StoreUnavailable` is propagated without retry — the tracer does not
//! retry store failures itself.

use thiserror::Error;
use trace_types::{SpanId, TraceId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("span position {got} is not the next position (expected {expected}) for trace {trace_id}")]
    OrderingViolation {
        trace_id: TraceId,
        expected: u64,
        got: u64,
    },

    #[error("trace {trace_id} is already closed")]
    AlreadyClosed { trace_id: TraceId },

    #[error("trace store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("trace {trace_id} not found")]
    TraceNotFound { trace_id: TraceId },

    #[error("span {span_id} not found")]
    SpanNotFound { span_id: SpanId },
}
