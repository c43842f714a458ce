//! Reference subscribers wired against the Event Bus: audit persistence,
//! trade analytics, and WebSocket broadcast relay. Each is independent —
//! a slow or failing one never blocks the others, since the bus gives each
//! subscription its own queue and consumer task.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{AnalyticsAggregatorAdapter, AuditPersister, BroadcastRelay};
pub use domain::{
    AnalyticsSnapshot, AuditRow, SubscriberError, TradeExecutedDecodeError, TRADE_EXECUTED_TOPIC,
};
pub use ports::{AuditStore, BroadcastHub};
