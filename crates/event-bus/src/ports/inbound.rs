//! The `EventBus` capability this crate provides to producers and
//! subscribers.

use crate::domain::{BusError, EventFilter, SubscriptionId};
use async_trait::async_trait;
use std::sync::Arc;

/// Invoked once per delivered message, in publish order for a given
/// subscription. Runs off the publisher's call stack on a dedicated
/// consumer task.
pub type Handler = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub topics: usize,
    pub total_subscribers: usize,
    pub backend: Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    InMemory,
    Durable,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::InMemory => write!(f, "in-memory"),
            Backend::Durable => write!(f, "durable"),
        }
    }
}

#[async_trait]
pub trait EventBus: Send + Sync {
    /// Serialize `payload` with the canonical encoding and deliver it to
    /// every subscriber of `topic`. Non-blocking for the publisher beyond
    /// the per-subscriber delivery timeout.
    async fn publish(&self, topic: &str, payload: &trace_types::DataValue) -> Result<(), BusError>;

    /// Subscribe to an exact topic. Returns the new subscription's id.
    async fn subscribe(&self, topic: &str, handler: Handler) -> Result<SubscriptionId, BusError>;

    /// Subscribe using a glob-style [`EventFilter`] instead of an exact
    /// topic match.
    async fn subscribe_filtered(
        &self,
        filter: EventFilter,
        handler: Handler,
    ) -> Result<SubscriptionId, BusError>;

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError>;

    /// Query a subscription's lifecycle state. Returns `Closed` for a
    /// subscription that has fully drained after `unsubscribe`/`close`.
    async fn subscription_state(
        &self,
        id: SubscriptionId,
    ) -> Result<crate::domain::SubscriptionState, BusError>;

    /// Close every subscription; in-flight publishes observe the shutdown
    /// and return.
    async fn close(&self);

    async fn health(&self) -> HealthReport;
}
