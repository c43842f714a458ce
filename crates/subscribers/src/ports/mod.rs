pub mod outbound;

pub use outbound::{AuditStore, BroadcastHub};
