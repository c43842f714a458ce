//! The capability `end_trace` enqueues an anchor request through,
//! fire-and-forget. Kept as a plain, non-async trait so the Tracer does not
//! need to depend on the Anchor Submitter crate just to hold a handle to it.

use crate::anchor::AnchorRequest;

pub trait AnchorSink: Send + Sync {
    fn try_enqueue(&self, request: AnchorRequest);
}
