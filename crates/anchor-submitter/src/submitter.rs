//! The `Submitter` capability: an abstract external immutable log. The
//! anchor submitter never defines a wire protocol to a real broker; that is
//! left to whatever implementation the host application supplies.

use crate::error::SubmitError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use trace_types::Hash;

#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub external_tx_id: String,
    pub sequence_number: u64,
    pub consensus_time: SystemTime,
    pub topic_id: String,
}

#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, merkle_root: Hash) -> Result<SubmitResult, SubmitError>;

    /// Whether this submitter fabricates receipts rather than talking to a
    /// real external log. Used to flag `AnchorReceipt::mock`.
    fn is_mock(&self) -> bool {
        false
    }
}

/// Configuration for a real external log. Constructed from environment
/// variables by `decision-runtime`; `operator_id`/`operator_key` absent
/// means mock mode.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub topic_id: String,
    pub operator_id: Option<String>,
    pub operator_key: Option<String>,
    pub network: Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Mainnet,
}

/// Synthesizes deterministic receipts so downstream code can proceed
/// without a configured external log. Selected automatically when operator
/// credentials are absent.
pub struct MockSubmitter {
    topic_id: String,
    next_sequence: AtomicU64,
}

impl MockSubmitter {
    #[must_use]
    pub fn new(topic_id: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            next_sequence: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Submitter for MockSubmitter {
    async fn submit(&self, _merkle_root: Hash) -> Result<SubmitResult, SubmitError> {
        let nanos = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let sequence_number = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        Ok(SubmitResult {
            external_tx_id: format!("mock-{nanos}"),
            sequence_number,
            consensus_time: SystemTime::now(),
            topic_id: self.topic_id.clone(),
        })
    }

    fn is_mock(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_submitter_produces_increasing_sequence_numbers() {
        let submitter = MockSubmitter::new("topic-1");
        let a = submitter.submit([0u8; 32]).await.unwrap();
        let b = submitter.submit([0u8; 32]).await.unwrap();
        assert!(b.sequence_number > a.sequence_number);
        assert!(a.external_tx_id.starts_with("mock-"));
    }
}
