//! Canonical serialization, SHA-256 span chaining, and Merkle root
//! computation. Every function here is pure: no I/O, no suspension points.

pub mod canonical;
pub mod hasher;
pub mod merkle;
pub mod verify;

pub use canonical::{canonical_encode, decode_data_value, encode_data_value, DecodeError, SpanContent};
pub use hasher::{hash_chained, hash_span};
pub use merkle::merkle_root;
pub use verify::verify_chain;
