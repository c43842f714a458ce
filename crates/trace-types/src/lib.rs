//! Core data model shared by every crate in the decision core workspace:
//! hashes, ids, the tagged value type, traces, spans, metrics, verification
//! records, anchor receipts, event envelopes, and the structured error type.

pub mod anchor;
pub mod error;
pub mod event;
pub mod hash;
pub mod ids;
pub mod metric;
pub mod signal;
pub mod sink;
pub mod span;
pub mod trace;
pub mod value;
pub mod verification;

pub use anchor::{AnchorReceipt, AnchorRequest, AnchorStatus};
pub use error::{ErrorKind, TraceError};
pub use event::Event;
pub use hash::{from_hex, to_hex, Hash, MalformedHex, ZERO_HASH};
pub use ids::{SpanId, TraceId};
pub use metric::Metric;
pub use signal::{Action, Signal};
pub use sink::AnchorSink;
pub use span::{Span, SpanStatus};
pub use trace::{Trace, TraceStatus};
pub use value::DataValue;
pub use verification::{VerificationKind, VerificationRecord};
