//! Single-process pub/sub with a durable-broker fallback. Producers and the
//! reference subscribers depend only on [`EventBus`]; which backend is live
//! is decided once, at construction.

mod adapters;
mod domain;
mod ports;

pub use adapters::{DurableEventBus, InMemoryEventBus, DEFAULT_PUBLISH_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
pub use domain::{BusError, EventFilter, SubscriptionId, SubscriptionState};
pub use ports::{Backend, EventBus, Handler, HealthReport};

use std::sync::Arc;
use std::time::Duration;

/// Configuration for [`build`]. `broker_url: None` always selects the
/// in-memory backend.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    pub broker_url: Option<String>,
    pub queue_capacity: usize,
    pub publish_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            broker_url: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

/// Try the durable backend if a broker is configured; fall back to
/// in-memory on connection failure, logging a warning either way.
pub async fn build(config: &EventBusConfig) -> Arc<dyn EventBus> {
    if let Some(url) = &config.broker_url {
        match DurableEventBus::connect(url).await {
            Ok(bus) => return Arc::new(bus),
            Err(e) => {
                tracing::warn!(error = %e, "durable event bus unavailable, falling back to in-memory");
            }
        }
    }
    Arc::new(InMemoryEventBus::new(
        config.queue_capacity,
        config.publish_timeout,
    ))
}
