//! Redis pub/sub backed `EventBus`. Delivery survives process restart;
//! publish may block briefly waiting for broker acknowledgement; ordering
//! is per topic per consumer group rather than per in-process subscriber.

use crate::domain::{BusError, EventFilter, SubscriptionId, SubscriptionState};
use crate::ports::inbound::{Backend, EventBus, Handler, HealthReport};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use trace_types::DataValue;

const PUBLISH_ACK_TIMEOUT: Duration = Duration::from_millis(500);

struct Subscriber {
    filter: EventFilter,
    state: Arc<Mutex<SubscriptionState>>,
    task: JoinHandle<()>,
}

pub struct DurableEventBus {
    client: redis::Client,
    subscribers: RwLock<HashMap<SubscriptionId, Subscriber>>,
}

impl DurableEventBus {
    /// Attempt to connect to a redis broker at `url`. Fails fast so the
    /// caller can fall back to the in-memory bus.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url)
            .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;
        let mut connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;
        let _: () = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            client,
            subscribers: RwLock::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl EventBus for DurableEventBus {
    async fn publish(&self, topic: &str, payload: &DataValue) -> Result<(), BusError> {
        let bytes = span_hasher::encode_data_value(payload);
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;
        tokio::time::timeout(PUBLISH_ACK_TIMEOUT, connection.publish::<_, _, i64>(topic, bytes))
            .await
            .map_err(|_| BusError::ConnectionFailed("publish ack timed out".to_string()))?
            .map_err(|e| BusError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Handler) -> Result<SubscriptionId, BusError> {
        self.subscribe_filtered(EventFilter::exact(topic), handler)
            .await
    }

    async fn subscribe_filtered(
        &self,
        filter: EventFilter,
        handler: Handler,
    ) -> Result<SubscriptionId, BusError> {
        let id = SubscriptionId::next();
        let state = Arc::new(Mutex::new(SubscriptionState::Active));
        let client = self.client.clone();
        let pattern = filter.clone();
        let task_state = state.clone();

        let task = tokio::spawn(async move {
            let connection = match client.get_async_connection().await {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(error = %e, "durable event bus subscriber failed to connect");
                    *task_state.lock().unwrap() = SubscriptionState::Closed;
                    return;
                }
            };
            let mut pubsub = connection.into_pubsub();
            if let Err(e) = pubsub.psubscribe(pattern.redis_pattern()).await {
                tracing::warn!(error = %e, "durable event bus psubscribe failed");
                *task_state.lock().unwrap() = SubscriptionState::Closed;
                return;
            }
            let mut stream = pubsub.on_message();
            use tokio_stream::StreamExt;
            while *task_state.lock().unwrap() == SubscriptionState::Active {
                match stream.next().await {
                    Some(message) => {
                        let channel: String = message.get_channel_name().to_string();
                        if !pattern.matches(&channel) {
                            continue;
                        }
                        if let Ok(payload) = message.get_payload::<Vec<u8>>() {
                            handler(payload);
                        }
                    }
                    None => break,
                }
            }
            *task_state.lock().unwrap() = SubscriptionState::Closed;
        });

        self.subscribers.write().await.insert(
            id,
            Subscriber {
                filter,
                state,
                task,
            },
        );
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        let mut subscribers = self.subscribers.write().await;
        let subscriber = subscribers
            .remove(&id)
            .ok_or(BusError::SubscriptionNotFound(id.value()))?;
        *subscriber.state.lock().unwrap() = SubscriptionState::Draining;
        subscriber.task.abort();
        Ok(())
    }

    async fn subscription_state(&self, id: SubscriptionId) -> Result<SubscriptionState, BusError> {
        let subscribers = self.subscribers.read().await;
        let subscriber = subscribers
            .get(&id)
            .ok_or(BusError::SubscriptionNotFound(id.value()))?;
        Ok(*subscriber.state.lock().unwrap())
    }

    async fn close(&self) {
        let mut subscribers = self.subscribers.write().await;
        for subscriber in subscribers.values() {
            *subscriber.state.lock().unwrap() = SubscriptionState::Draining;
            subscriber.task.abort();
        }
        subscribers.clear();
    }

    async fn health(&self) -> HealthReport {
        let subscribers = self.subscribers.read().await;
        HealthReport {
            topics: subscribers.len(),
            total_subscribers: subscribers.len(),
            backend: Backend::Durable,
        }
    }
}
