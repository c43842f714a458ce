//! Binary Merkle tree over an ordered sequence of span hashes.

use sha2::{Digest, Sha256};
use trace_types::{Hash, ZERO_HASH};

/// Binary Merkle root over `leaves`, duplicating the last node of an odd
/// layer ("Bitcoin-style"). An empty input maps to the all-zero hash.
#[must_use]
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }
    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = *level.last().expect("level is non-empty");
            level.push(last);
        }
        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks_exact(2) {
            let mut hasher = Sha256::new();
            hasher.update(pair[0]);
            hasher.update(pair[1]);
            next.push(hasher.finalize().into());
        }
        level = next;
    }
    level[0]
}
