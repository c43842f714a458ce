//! Tagged-variant payload type used for span input/output snapshots and
//! event bodies.
//!
//! `spec.md` §9 flags "dynamic maps carrying heterogeneous payloads" as a
//! pattern that needs re-architecture: rather than exposing a language's
//! untyped container, the core exposes payloads as this closed set of
//! primitive kinds. `Map` uses a `BTreeMap` so lexicographic key order
//! (required by the canonical encoding, §4.1) is structural rather than a
//! step a caller can forget.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A primitive value kind accepted by the canonical encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum DataValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<DataValue>),
    Map(BTreeMap<String, DataValue>),
}

impl DataValue {
    /// Build a map value from key/value pairs, sorting is automatic via
    /// `BTreeMap`.
    #[must_use]
    pub fn map(entries: impl IntoIterator<Item = (String, DataValue)>) -> Self {
        DataValue::Map(entries.into_iter().collect())
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Str(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Str(s)
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int(v)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Float(v)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Bool(v)
    }
}
