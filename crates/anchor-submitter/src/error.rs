//! Errors surfaced by the Submitter capability and the submission loop.

use thiserror::Error;

/// Returned by a `Submitter` implementation. `Transient` failures are
/// retried with backoff; `Permanent` failures fail the receipt immediately.
#[derive(Debug, Error, Clone)]
pub enum SubmitError {
    #[error("transient submission failure: {0}")]
    Transient(String),
    #[error("permanent submission failure: {0}")]
    Permanent(String),
}

#[derive(Debug, Error, Clone)]
pub enum AnchorError {
    #[error("anchor queue full, request dropped for trace {trace_id}")]
    QueueFull { trace_id: trace_types::TraceId },
    #[error("trace store error: {0}")]
    Store(#[from] trace_store::StoreError),
}
