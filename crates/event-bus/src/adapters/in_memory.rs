//! Single-process pub/sub. One RW-lock guards the subscriber table;
//! `subscribe`/`unsubscribe` take the write lock, `publish` takes the read
//! lock. Each subscriber owns a bounded queue drained by its own consumer
//! task; a slow consumer only ever loses messages addressed to it.

use crate::domain::{BusError, EventFilter, SubscriptionId, SubscriptionState};
use crate::ports::inbound::{Backend, EventBus, Handler, HealthReport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use trace_types::DataValue;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_millis(100);

type StateCell = Arc<Mutex<SubscriptionState>>;

struct Subscriber {
    filter: EventFilter,
    sender: mpsc::Sender<Vec<u8>>,
    state: StateCell,
}

pub struct InMemoryEventBus {
    subscribers: RwLock<HashMap<SubscriptionId, Subscriber>>,
    states: RwLock<HashMap<SubscriptionId, StateCell>>,
    queue_capacity: usize,
    publish_timeout: Duration,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY, DEFAULT_PUBLISH_TIMEOUT)
    }
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new(queue_capacity: usize, publish_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            states: RwLock::new(HashMap::new()),
            queue_capacity,
            publish_timeout,
        }
    }

    async fn add_subscription(&self, filter: EventFilter, handler: Handler) -> SubscriptionId {
        let (sender, mut receiver) = mpsc::channel::<Vec<u8>>(self.queue_capacity);
        let id = SubscriptionId::next();
        let state: StateCell = Arc::new(Mutex::new(SubscriptionState::Active));

        let task_state = state.clone();
        tokio::spawn(async move {
            while let Some(payload) = receiver.recv().await {
                handler(payload);
            }
            *task_state.lock().unwrap() = SubscriptionState::Closed;
        });

        self.subscribers.write().await.insert(
            id,
            Subscriber {
                filter,
                sender,
                state: state.clone(),
            },
        );
        self.states.write().await.insert(id, state);
        id
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, payload: &DataValue) -> Result<(), BusError> {
        decision_telemetry::EVENTBUS_PUBLISHES.inc();
        let bytes = span_hasher::encode_data_value(payload);
        let subscribers = self.subscribers.read().await;
        for (id, subscriber) in subscribers.iter() {
            if !subscriber.filter.matches(topic) {
                continue;
            }
            decision_telemetry::EVENTBUS_QUEUE_DEPTH
                .set((self.queue_capacity - subscriber.sender.capacity()) as f64);
            match tokio::time::timeout(self.publish_timeout, subscriber.sender.send(bytes.clone()))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(_send_error)) => {
                    decision_telemetry::EVENTBUS_DROPS.with_label_values(&["closed"]).inc();
                    tracing::warn!(subscription = %id, topic, "subscriber channel closed, message dropped");
                }
                Err(_elapsed) => {
                    decision_telemetry::EVENTBUS_DROPS.with_label_values(&["timeout"]).inc();
                    tracing::warn!(subscription = %id, topic, "subscriber queue full, message dropped");
                }
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Handler) -> Result<SubscriptionId, BusError> {
        Ok(self.add_subscription(EventFilter::exact(topic), handler).await)
    }

    async fn subscribe_filtered(
        &self,
        filter: EventFilter,
        handler: Handler,
    ) -> Result<SubscriptionId, BusError> {
        Ok(self.add_subscription(filter, handler).await)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        let mut subscribers = self.subscribers.write().await;
        let subscriber = subscribers
            .remove(&id)
            .ok_or(BusError::SubscriptionNotFound(id.value()))?;
        *subscriber.state.lock().unwrap() = SubscriptionState::Draining;
        Ok(())
    }

    async fn subscription_state(&self, id: SubscriptionId) -> Result<SubscriptionState, BusError> {
        let states = self.states.read().await;
        let state = states
            .get(&id)
            .ok_or(BusError::SubscriptionNotFound(id.value()))?;
        Ok(*state.lock().unwrap())
    }

    async fn close(&self) {
        let mut subscribers = self.subscribers.write().await;
        for subscriber in subscribers.values() {
            *subscriber.state.lock().unwrap() = SubscriptionState::Draining;
        }
        subscribers.clear();
    }

    async fn health(&self) -> HealthReport {
        let subscribers = self.subscribers.read().await;
        HealthReport {
            topics: subscribers.len(),
            total_subscribers: subscribers.len(),
            backend: Backend::InMemory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn data(n: i64) -> DataValue {
        DataValue::Int(n)
    }

    #[tokio::test]
    async fn subscriber_sees_messages_in_publish_order() {
        let bus = InMemoryEventBus::default();
        let received = Arc::new(Mutex::new(Vec::new()));
        let recv_clone = received.clone();
        let handler: Handler = Arc::new(move |bytes| {
            recv_clone.lock().unwrap().push(bytes);
        });
        bus.subscribe("trade.executed", handler).await.unwrap();

        for i in 0..5 {
            bus.publish("trade.executed", &data(i)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let got = received.lock().unwrap();
        assert_eq!(got.len(), 5);
        for (i, bytes) in got.iter().enumerate() {
            assert_eq!(*bytes, span_hasher::encode_data_value(&data(i as i64)));
        }
    }

    #[tokio::test]
    async fn other_topics_are_not_delivered() {
        let bus = InMemoryEventBus::default();
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        let handler: Handler = Arc::new(move |_| *count_clone.lock().unwrap() += 1);
        bus.subscribe("trade.executed", handler).await.unwrap();

        bus.publish("trade.rejected", &data(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn full_queue_drops_for_that_subscriber_only() {
        let bus = InMemoryEventBus::new(1, Duration::from_millis(20));
        let slow_count = Arc::new(Mutex::new(0));
        let slow_clone = slow_count.clone();
        let slow: Handler = Arc::new(move |_| {
            std::thread::sleep(Duration::from_millis(200));
            *slow_clone.lock().unwrap() += 1;
        });
        let fast_count = Arc::new(Mutex::new(0));
        let fast_clone = fast_count.clone();
        let fast: Handler = Arc::new(move |_| *fast_clone.lock().unwrap() += 1);

        bus.subscribe("trade.executed", slow).await.unwrap();
        bus.subscribe("trade.executed", fast).await.unwrap();

        for i in 0..5 {
            bus.publish("trade.executed", &data(i)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*fast_count.lock().unwrap(), 5);
        assert!(*slow_count.lock().unwrap() < 5);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = InMemoryEventBus::default();
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        let handler: Handler = Arc::new(move |_| *count_clone.lock().unwrap() += 1);
        let id = bus.subscribe("trade.executed", handler).await.unwrap();

        bus.unsubscribe(id).await.unwrap();
        bus.publish("trade.executed", &data(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn subscription_state_transitions_to_closed_after_unsubscribe() {
        let bus = InMemoryEventBus::default();
        let id = bus
            .subscribe("trade.executed", Arc::new(|_| {}))
            .await
            .unwrap();
        assert_eq!(
            bus.subscription_state(id).await.unwrap(),
            SubscriptionState::Active
        );

        bus.unsubscribe(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            bus.subscription_state(id).await.unwrap(),
            SubscriptionState::Closed
        );
    }

    #[tokio::test]
    async fn health_reports_subscriber_count() {
        let bus = InMemoryEventBus::default();
        bus.subscribe("trade.executed", Arc::new(|_| {})).await.unwrap();
        bus.subscribe("trade.rejected", Arc::new(|_| {})).await.unwrap();

        let health = bus.health().await;
        assert_eq!(health.total_subscribers, 2);
        assert_eq!(health.backend, Backend::InMemory);
    }
}
