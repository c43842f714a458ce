pub mod outbound;

pub use outbound::{SpanHashRow, TraceStore};
