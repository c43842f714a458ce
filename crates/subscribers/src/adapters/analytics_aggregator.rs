//! Subscribes to `trade_executed` and feeds the rolling analytics counters.
//! Kept separate from the audit persister so a slow or unavailable audit
//! store can never stall analytics, and vice versa.

use crate::domain::{AnalyticsAggregator, AnalyticsSnapshot, TRADE_EXECUTED_TOPIC};
use event_bus::EventBus;
use std::sync::Arc;

pub struct AnalyticsAggregatorAdapter {
    aggregator: Arc<AnalyticsAggregator>,
}

impl Default for AnalyticsAggregatorAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsAggregatorAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            aggregator: Arc::new(AnalyticsAggregator::new()),
        }
    }

    #[must_use]
    pub fn stats(&self) -> AnalyticsSnapshot {
        self.aggregator.stats()
    }

    pub async fn attach(
        &self,
        bus: &dyn EventBus,
    ) -> Result<event_bus::SubscriptionId, event_bus::BusError> {
        let aggregator = self.aggregator.clone();
        bus.subscribe(
            TRADE_EXECUTED_TOPIC,
            Arc::new(move |payload: Vec<u8>| {
                let value = match span_hasher::decode_data_value(&payload) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping trade_executed payload: decode failed");
                        return;
                    }
                };
                let row = match crate::domain::AuditRow::from_payload(&value, Vec::new()) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping trade_executed payload: malformed row");
                        return;
                    }
                };
                aggregator.record_trade(&row.pair, &row.direction, row.size, row.execution_ms);
            }),
        )
        .await
    }
}
