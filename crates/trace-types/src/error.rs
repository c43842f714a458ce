//! The structured error shape surfaced to callers across the core.
//!
//! Per the propagation policy, the core reports and does not decide: every
//! fallible operation returns one of these kinds along with the trace/span
//! it happened to and a human-readable cause, never a panic on external
//! input.

use crate::ids::{SpanId, TraceId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OrderingViolation,
    AlreadyClosed,
    StoreUnavailable,
    ChainBroken,
    QueueFull,
    AnchorTransient,
    AnchorPermanent,
    MalformedHex,
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::OrderingViolation => "ordering_violation",
            ErrorKind::AlreadyClosed => "already_closed",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::ChainBroken => "chain_broken",
            ErrorKind::QueueFull => "queue_full",
            ErrorKind::AnchorTransient => "anchor_transient",
            ErrorKind::AnchorPermanent => "anchor_permanent",
            ErrorKind::MalformedHex => "malformed_hex",
            ErrorKind::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// A structured, cross-component error carrying enough context for a caller
/// to decide what to do without re-deriving it from a string.
#[derive(Debug, Clone)]
pub struct TraceError {
    pub kind: ErrorKind,
    pub trace_id: Option<TraceId>,
    pub span_id: Option<SpanId>,
    pub cause: String,
}

impl TraceError {
    #[must_use]
    pub fn new(kind: ErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            trace_id: None,
            span_id: None,
            cause: cause.into(),
        }
    }

    #[must_use]
    pub fn with_trace(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    #[must_use]
    pub fn with_span(mut self, span_id: SpanId) -> Self {
        self.span_id = Some(span_id);
        self
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.cause)?;
        if let Some(trace_id) = self.trace_id {
            write!(f, " (trace={trace_id})")?;
        }
        if let Some(span_id) = self.span_id {
            write!(f, " (span={span_id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for TraceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_ids_when_present() {
        let err = TraceError::new(ErrorKind::OrderingViolation, "position out of order")
            .with_trace(TraceId::new());
        let rendered = err.to_string();
        assert!(rendered.contains("ordering_violation"));
        assert!(rendered.contains("trace="));
    }
}
