#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("subscribed payload failed canonical decoding: {0}")]
    Decode(#[from] span_hasher::DecodeError),

    #[error("audit payload rejected: {0}")]
    Audit(#[from] super::audit::TradeExecutedDecodeError),

    #[error("audit store write failed: {0}")]
    Store(String),
}
