//! Capabilities the reference subscribers depend on. Neither trait names a
//! concrete backend; persistence and the WebSocket hub itself live outside
//! this crate's scope.

use crate::domain::AuditRow;
use async_trait::async_trait;

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn write_audit_row(&self, row: AuditRow) -> Result<(), String>;
}

/// Fire-and-forget forwarding to an external WebSocket hub. Kept non-async,
/// same reasoning as `trace_types::AnchorSink`: a slow or absent hub must
/// never make a subscriber's consumer task block.
pub trait BroadcastHub: Send + Sync {
    fn try_broadcast(&self, event_type: &str, payload: Vec<u8>);
}
