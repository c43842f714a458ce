//! SHA-256 chaining of canonically-encoded span content.

use crate::canonical::{canonical_encode, SpanContent};
use sha2::{Digest, Sha256};
use trace_types::Hash;

/// Compute `(sha256, data_snapshot)` for a span, chained to `previous_hash`.
///
/// `data_snapshot` is exactly the byte string fed to the hash, so a verifier
/// holding only the stored snapshot and `previous_hash` can reproduce
/// `sha256` without re-deriving the content.
#[must_use]
pub fn hash_span(content: &SpanContent<'_>, previous_hash: &Hash) -> (Hash, Vec<u8>) {
    let data_snapshot = canonical_encode(content);
    let sha256 = hash_chained(&data_snapshot, previous_hash);
    (sha256, data_snapshot)
}

/// `SHA-256(data_snapshot || previous_hash)`, the primitive both `hash_span`
/// and chain verification recompute independently.
#[must_use]
pub fn hash_chained(data_snapshot: &[u8], previous_hash: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data_snapshot);
    hasher.update(previous_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_types::{TraceId, ZERO_HASH};

    fn content() -> SpanContent<'static> {
        SpanContent {
            trace_id: TraceId::new(),
            chain_position: 0,
            name: "execute",
            kind: "trade_execution",
            start_time_nanos: 1,
            end_time_nanos: None,
            input_snapshot: &[],
            output_snapshot: None,
            reasoning: None,
            confidence: None,
            status: trace_types::SpanStatus::Running,
        }
    }

    #[test]
    fn hash_is_reproducible_from_data_snapshot_alone() {
        let c = content();
        let (sha256, data_snapshot) = hash_span(&c, &ZERO_HASH);
        assert_eq!(hash_chained(&data_snapshot, &ZERO_HASH), sha256);
    }

    #[test]
    fn different_previous_hash_changes_the_digest() {
        let c = content();
        let (a, _) = hash_span(&c, &ZERO_HASH);
        let (b, _) = hash_span(&c, &[0xFFu8; 32]);
        assert_ne!(a, b);
    }
}
