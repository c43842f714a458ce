//! Relays selected event types to an external WebSocket hub. The hub itself
//! is out of scope here; this adapter only owns the subscribe-and-forward
//! wiring against the [`BroadcastHub`] port.

use crate::ports::BroadcastHub;
use event_bus::EventBus;
use std::sync::Arc;

pub struct BroadcastRelay<H: BroadcastHub> {
    hub: Arc<H>,
}

impl<H: BroadcastHub + 'static> BroadcastRelay<H> {
    #[must_use]
    pub fn new(hub: Arc<H>) -> Self {
        Self { hub }
    }

    /// Subscribe to each of `event_types` and forward delivered payloads to
    /// the hub verbatim, tagged with the topic they arrived on.
    pub async fn attach(
        &self,
        bus: &dyn EventBus,
        event_types: &[&str],
    ) -> Result<Vec<event_bus::SubscriptionId>, event_bus::BusError> {
        let mut ids = Vec::with_capacity(event_types.len());
        for event_type in event_types {
            let hub = self.hub.clone();
            let event_type = (*event_type).to_string();
            let id = bus
                .subscribe(
                    &event_type,
                    Arc::new(move |payload: Vec<u8>| {
                        hub.try_broadcast(&event_type, payload);
                    }),
                )
                .await?;
            ids.push(id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::InMemoryEventBus;
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};
    use trace_types::DataValue;

    #[derive(Default)]
    struct RecordingHub {
        forwarded: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl BroadcastHub for RecordingHub {
        fn try_broadcast(&self, event_type: &str, payload: Vec<u8>) {
            self.forwarded
                .lock()
                .unwrap()
                .push((event_type.to_string(), payload));
        }
    }

    #[tokio::test]
    async fn forwards_subscribed_event_types() {
        let bus = InMemoryEventBus::new(16, Duration::from_millis(100));
        let hub = Arc::new(RecordingHub::default());
        let relay = BroadcastRelay::new(hub.clone());
        relay.attach(&bus, &["trade_executed"]).await.unwrap();

        bus.publish("trade_executed", &DataValue::from("payload"))
            .await
            .unwrap();
        bus.publish("trade_rejected", &DataValue::from("ignored"))
            .await
            .unwrap();
        sleep(Duration::from_millis(30)).await;

        let forwarded = hub.forwarded.lock().unwrap();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].0, "trade_executed");
    }
}
