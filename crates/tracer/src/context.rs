//! Cancellation/deadline token threaded through every public Tracer call.

/// A cancellation signal. Cloning shares the same underlying flag; callers
/// typically hold one `Ctx` per in-flight trace and cancel it to force
/// remaining running spans to `failed`.
pub type Ctx = tokio_util::sync::CancellationToken;
