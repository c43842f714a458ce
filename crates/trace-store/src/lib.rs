//! Persistence abstraction for traces, spans, metrics, verifications, and
//! anchor receipts. Laid out hexagonally: `domain` holds errors, `ports`
//! holds the capability the rest of the workspace depends on, `adapters`
//! holds concrete implementations.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{FileTraceStore, InMemoryTraceStore};
pub use domain::StoreError;
pub use ports::{SpanHashRow, TraceStore};
