pub mod analytics;
pub mod audit;
pub mod errors;

pub use analytics::{AnalyticsAggregator, AnalyticsSnapshot};
pub use audit::{AuditRow, TradeExecutedDecodeError, TRADE_EXECUTED_TOPIC};
pub use errors::SubscriberError;
