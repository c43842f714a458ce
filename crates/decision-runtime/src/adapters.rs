//! Reference implementations of the capabilities this workspace only
//! defines as trait boundaries (`AuditStore`, `BroadcastHub`). A host
//! application with a real database or websocket fan-out swaps these for
//! its own adapters; these exist so the demo binary and integration tests
//! have something concrete to run against, the same role `MockSubmitter`
//! and `InMemoryTraceStore` play for their own capabilities.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use subscribers::{AuditRow, AuditStore, BroadcastHub};

/// Logs every row at info level instead of writing to a real database.
#[derive(Debug, Default)]
pub struct LoggingAuditStore {
    written: AtomicUsize,
}

impl LoggingAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written_count(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditStore for LoggingAuditStore {
    async fn write_audit_row(&self, row: AuditRow) -> Result<(), String> {
        self.written.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            pair = %row.pair,
            direction = %row.direction,
            size = row.size,
            price = row.price,
            environment = %row.environment,
            status = %row.status,
            "audit row"
        );
        Ok(())
    }
}

/// Logs broadcasts instead of fanning out to connected clients.
#[derive(Debug, Default)]
pub struct LoggingBroadcastHub {
    forwarded: AtomicUsize,
}

impl LoggingBroadcastHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarded_count(&self) -> usize {
        self.forwarded.load(Ordering::SeqCst)
    }
}

impl BroadcastHub for LoggingBroadcastHub {
    fn try_broadcast(&self, event_type: &str, payload: Vec<u8>) {
        self.forwarded.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(event_type, bytes = payload.len(), "broadcast");
    }
}
