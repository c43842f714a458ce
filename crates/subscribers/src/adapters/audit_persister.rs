//! Subscribes to `trade_executed` and persists a structured row per event.
//! Decode or store failures are logged; they never propagate back to the
//! bus, since a single bad payload must not take down the subscription.

use crate::domain::{AuditRow, TRADE_EXECUTED_TOPIC};
use crate::ports::AuditStore;
use event_bus::EventBus;
use std::sync::Arc;

pub struct AuditPersister<A: AuditStore> {
    store: Arc<A>,
}

impl<A: AuditStore + 'static> AuditPersister<A> {
    #[must_use]
    pub fn new(store: Arc<A>) -> Self {
        Self { store }
    }

    /// Subscribe to the canonical `trade_executed` topic on `bus`. The
    /// returned subscription id can be passed to `EventBus::unsubscribe`.
    pub async fn attach(
        &self,
        bus: &dyn EventBus,
    ) -> Result<event_bus::SubscriptionId, event_bus::BusError> {
        let store = self.store.clone();
        bus.subscribe(
            TRADE_EXECUTED_TOPIC,
            Arc::new(move |payload: Vec<u8>| {
                let store = store.clone();
                let raw = payload.clone();
                tokio::spawn(async move {
                    let value = match span_hasher::decode_data_value(&payload) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping trade_executed payload: decode failed");
                            return;
                        }
                    };
                    let row = match AuditRow::from_payload(&value, raw) {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping trade_executed payload: malformed row");
                            return;
                        }
                    };
                    if let Err(e) = store.write_audit_row(row).await {
                        tracing::warn!(error = %e, "audit store write failed");
                    }
                });
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use event_bus::InMemoryEventBus;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};
    use trace_types::DataValue;

    struct RecordingStore {
        rows: Mutex<Vec<AuditRow>>,
    }

    #[async_trait]
    impl AuditStore for RecordingStore {
        async fn write_audit_row(&self, row: AuditRow) -> Result<(), String> {
            self.rows.lock().unwrap().push(row);
            Ok(())
        }
    }

    #[tokio::test]
    async fn persists_a_well_formed_trade_executed_event() {
        let bus = InMemoryEventBus::new(16, Duration::from_millis(100));
        let store = Arc::new(RecordingStore {
            rows: Mutex::new(Vec::new()),
        });
        let persister = AuditPersister::new(store.clone());
        persister.attach(&bus).await.unwrap();

        let mut map = BTreeMap::new();
        map.insert("trade_id".to_string(), DataValue::from("t-1"));
        map.insert("symbol".to_string(), DataValue::from("SOL/USDC"));
        map.insert("side".to_string(), DataValue::from("BUY"));
        map.insert("amount".to_string(), DataValue::from(10.0));
        map.insert("price".to_string(), DataValue::from(150.0));
        map.insert("exchange_id".to_string(), DataValue::from("mainnet"));
        map.insert("status".to_string(), DataValue::from("confirmed"));
        map.insert("execution_ms".to_string(), DataValue::from(42));

        bus.publish(TRADE_EXECUTED_TOPIC, &DataValue::Map(map))
            .await
            .unwrap();

        sleep(Duration::from_millis(50)).await;
        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pair, "SOL/USDC");
    }
}
