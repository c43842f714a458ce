pub mod analytics_aggregator;
pub mod audit_persister;
pub mod broadcast_hub;

pub use analytics_aggregator::AnalyticsAggregatorAdapter;
pub use audit_persister::AuditPersister;
pub use broadcast_hub::BroadcastRelay;
