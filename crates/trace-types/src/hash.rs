//! The 32-byte digest type shared by spans, traces, and Merkle roots.

use thiserror::Error;

/// A raw SHA-256 digest.
pub type Hash = [u8; 32];

/// The all-zero hash, used as the Merkle root of an empty span sequence.
pub const ZERO_HASH: Hash = [0u8; 32];

/// A hex string did not decode to a valid 32-byte hash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed hash hex: {reason}")]
pub struct MalformedHex {
    pub reason: String,
}

/// Encode a hash as lowercase hex.
#[must_use]
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Decode a hex string into a 32-byte hash.
///
/// An empty string decodes to `ZERO_HASH`, matching the convention that a
/// span at chain position 0 has an empty `previous_hash`.
pub fn from_hex(s: &str) -> Result<Hash, MalformedHex> {
    if s.is_empty() {
        return Ok(ZERO_HASH);
    }
    let bytes = hex::decode(s).map_err(|e| MalformedHex {
        reason: e.to_string(),
    })?;
    bytes.try_into().map_err(|v: Vec<u8>| MalformedHex {
        reason: format!("expected 32 bytes, got {}", v.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_hex() {
        let hash: Hash = [0xABu8; 32];
        let encoded = to_hex(&hash);
        assert_eq!(from_hex(&encoded).unwrap(), hash);
    }

    #[test]
    fn empty_string_is_zero_hash() {
        assert_eq!(from_hex("").unwrap(), ZERO_HASH);
    }

    #[test]
    fn rejects_short_hex() {
        assert!(from_hex("abcd").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(from_hex("not-hex-at-all-zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_err());
    }

    #[test]
    fn random_hashes_round_trip_through_hex() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let hash: Hash = rng.gen();
            assert_eq!(from_hex(&to_hex(&hash)).unwrap(), hash);
        }
    }
}
