use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BusError {
    #[error("subscription {0} not found")]
    SubscriptionNotFound(u64),

    #[error("event bus is closed")]
    Closed,

    #[error("durable broker connection failed: {0}")]
    ConnectionFailed(String),
}
