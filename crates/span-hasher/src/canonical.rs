//! Deterministic byte encoding of span content and arbitrary `DataValue`
//! payloads.
//!
//! Two independent verifiers must recompute identical hashes from a stored
//! `data_snapshot` alone, so every field is framed with an explicit length
//! prefix rather than a delimiter byte — there is no input that can smuggle
//! extra framing into the encoded stream.

use std::collections::BTreeMap;
use trace_types::{DataValue, SpanStatus, TraceId};

fn write_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn write_tagged_option(buf: &mut Vec<u8>, bytes: Option<&[u8]>) {
    match bytes {
        Some(b) => {
            buf.push(1);
            write_len_prefixed(buf, b);
        }
        None => buf.push(0),
    }
}

/// Rust's float `Display` emits the shortest decimal string that round-trips
/// back to the same `f64`, which is exactly what the encoding contract
/// requires for generic floats inside `DataValue`.
fn format_float(f: f64) -> String {
    format!("{f}")
}

fn encode_value(value: &DataValue, buf: &mut Vec<u8>) {
    match value {
        DataValue::Null => buf.push(0),
        DataValue::Bool(b) => {
            buf.push(1);
            buf.push(u8::from(*b));
        }
        DataValue::Int(i) => {
            buf.push(2);
            buf.extend_from_slice(&i.to_be_bytes());
        }
        DataValue::Float(f) => {
            buf.push(3);
            write_len_prefixed(buf, format_float(*f).as_bytes());
        }
        DataValue::Str(s) => {
            buf.push(4);
            write_len_prefixed(buf, s.as_bytes());
        }
        DataValue::Bytes(b) => {
            buf.push(5);
            write_len_prefixed(buf, b);
        }
        DataValue::Array(items) => {
            buf.push(6);
            buf.extend_from_slice(&(items.len() as u64).to_be_bytes());
            for item in items {
                encode_value(item, buf);
            }
        }
        DataValue::Map(map) => {
            buf.push(7);
            buf.extend_from_slice(&(map.len() as u64).to_be_bytes());
            // `BTreeMap` iterates in key order, so lexicographic ordering is
            // structural here rather than an explicit sort step.
            for (key, val) in map {
                write_len_prefixed(buf, key.as_bytes());
                encode_value(val, buf);
            }
        }
    }
}

/// Encode a `DataValue` (an input or output snapshot, or an event payload)
/// to canonical bytes.
#[must_use]
pub fn encode_data_value(value: &DataValue) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value(value, &mut buf);
    buf
}

/// Error decoding a byte string produced by [`encode_data_value`] back into
/// a `DataValue`. Only ever returned for truncated or corrupted input; a
/// buffer produced by `encode_data_value` always decodes successfully.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed canonical data value encoding")]
pub struct DecodeError;

fn read_u64(bytes: &[u8], offset: &mut usize) -> Result<u64, DecodeError> {
    let end = *offset + 8;
    let slice = bytes.get(*offset..end).ok_or(DecodeError)?;
    *offset = end;
    Ok(u64::from_be_bytes(slice.try_into().map_err(|_| DecodeError)?))
}

fn read_len_prefixed<'a>(bytes: &'a [u8], offset: &mut usize) -> Result<&'a [u8], DecodeError> {
    let len = read_u64(bytes, offset)? as usize;
    let end = *offset + len;
    let slice = bytes.get(*offset..end).ok_or(DecodeError)?;
    *offset = end;
    Ok(slice)
}

fn decode_value(bytes: &[u8], offset: &mut usize) -> Result<DataValue, DecodeError> {
    let tag = *bytes.get(*offset).ok_or(DecodeError)?;
    *offset += 1;
    match tag {
        0 => Ok(DataValue::Null),
        1 => {
            let b = *bytes.get(*offset).ok_or(DecodeError)?;
            *offset += 1;
            Ok(DataValue::Bool(b != 0))
        }
        2 => {
            let end = *offset + 8;
            let slice = bytes.get(*offset..end).ok_or(DecodeError)?;
            *offset = end;
            Ok(DataValue::Int(i64::from_be_bytes(
                slice.try_into().map_err(|_| DecodeError)?,
            )))
        }
        3 => {
            let raw = read_len_prefixed(bytes, offset)?;
            let s = std::str::from_utf8(raw).map_err(|_| DecodeError)?;
            Ok(DataValue::Float(s.parse().map_err(|_| DecodeError)?))
        }
        4 => {
            let raw = read_len_prefixed(bytes, offset)?;
            Ok(DataValue::Str(
                std::str::from_utf8(raw).map_err(|_| DecodeError)?.to_string(),
            ))
        }
        5 => Ok(DataValue::Bytes(read_len_prefixed(bytes, offset)?.to_vec())),
        6 => {
            let count = read_u64(bytes, offset)?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(decode_value(bytes, offset)?);
            }
            Ok(DataValue::Array(items))
        }
        7 => {
            let count = read_u64(bytes, offset)?;
            let mut map = BTreeMap::new();
            for _ in 0..count {
                let key_raw = read_len_prefixed(bytes, offset)?;
                let key = std::str::from_utf8(key_raw).map_err(|_| DecodeError)?.to_string();
                let value = decode_value(bytes, offset)?;
                map.insert(key, value);
            }
            Ok(DataValue::Map(map))
        }
        _ => Err(DecodeError),
    }
}

/// Inverse of [`encode_data_value`]. Used by event-bus subscribers that need
/// the structured payload back, not just its bytes.
pub fn decode_data_value(bytes: &[u8]) -> Result<DataValue, DecodeError> {
    let mut offset = 0;
    let value = decode_value(bytes, &mut offset)?;
    if offset != bytes.len() {
        return Err(DecodeError);
    }
    Ok(value)
}

fn status_tag(status: SpanStatus) -> &'static str {
    match status {
        SpanStatus::Running => "running",
        SpanStatus::Success => "success",
        SpanStatus::Failed => "failed",
    }
}

/// The identifying content of a span at the moment it is hashed. Used both
/// for the provisional hash computed at `start_span` (output/reasoning/
/// confidence absent) and the final hash computed at `end_span`.
#[derive(Debug, Clone)]
pub struct SpanContent<'a> {
    pub trace_id: TraceId,
    pub chain_position: u64,
    pub name: &'a str,
    pub kind: &'a str,
    pub start_time_nanos: i64,
    pub end_time_nanos: Option<i64>,
    pub input_snapshot: &'a [u8],
    pub output_snapshot: Option<&'a [u8]>,
    pub reasoning: Option<&'a str>,
    /// Confidence in [0, 1]. Encoded as a fixed-precision decimal string,
    /// distinct from the shortest-round-trip encoding used for generic
    /// `DataValue` floats, so that a confidence of `0.9` and `0.9002` hash
    /// differently but float noise well below the precision does not.
    pub confidence: Option<f64>,
    pub status: SpanStatus,
}

const CONFIDENCE_PRECISION: usize = 4;

/// Map a span's identifying content to a byte string stable across
/// implementations.
#[must_use]
pub fn canonical_encode(content: &SpanContent<'_>) -> Vec<u8> {
    let mut buf = Vec::new();
    write_len_prefixed(&mut buf, content.trace_id.0.as_bytes());
    buf.extend_from_slice(&content.chain_position.to_be_bytes());
    write_len_prefixed(&mut buf, content.name.as_bytes());
    write_len_prefixed(&mut buf, content.kind.as_bytes());
    buf.extend_from_slice(&content.start_time_nanos.to_be_bytes());
    match content.end_time_nanos {
        Some(t) => {
            buf.push(1);
            buf.extend_from_slice(&t.to_be_bytes());
        }
        None => buf.push(0),
    }
    write_len_prefixed(&mut buf, content.input_snapshot);
    write_tagged_option(&mut buf, content.output_snapshot);
    match content.reasoning {
        Some(r) => {
            buf.push(1);
            write_len_prefixed(&mut buf, r.as_bytes());
        }
        None => buf.push(0),
    }
    match content.confidence {
        Some(c) => {
            buf.push(1);
            let precision = CONFIDENCE_PRECISION;
            let decimal = format!("{c:.precision$}");
            write_len_prefixed(&mut buf, decimal.as_bytes());
        }
        None => buf.push(0),
    }
    write_len_prefixed(&mut buf, status_tag(content.status).as_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_content() -> SpanContent<'static> {
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
            status: SpanStatus::Running,
        }
    }

    #[test]
    fn identical_content_encodes_identically() {
        let content = sample_content();
        assert_eq!(canonical_encode(&content), canonical_encode(&content));
    }

    #[test]
    fn chain_position_changes_the_encoding() {
        let mut a = sample_content();
        let mut b = a.clone();
        a.chain_position = 0;
        b.chain_position = 1;
        assert_ne!(canonical_encode(&a), canonical_encode(&b));
    }

    #[test]
    fn confidence_is_fixed_precision() {
        let mut a = sample_content();
        let mut b = a.clone();
        a.confidence = Some(0.9);
        b.confidence = Some(0.90001);
        // Both round to 0.9000 at 4dp precision, so they must collide.
        assert_eq!(canonical_encode(&a), canonical_encode(&b));
        b.confidence = Some(0.9002);
        assert_ne!(canonical_encode(&a), canonical_encode(&b));
    }

    #[test]
    fn map_key_order_does_not_affect_encoding() {
        let mut m1 = BTreeMap::new();
        m1.insert("b".to_string(), DataValue::Int(2));
        m1.insert("a".to_string(), DataValue::Int(1));
        let v1 = DataValue::Map(m1);

        let mut m2 = BTreeMap::new();
        m2.insert("a".to_string(), DataValue::Int(1));
        m2.insert("b".to_string(), DataValue::Int(2));
        let v2 = DataValue::Map(m2);

        assert_eq!(encode_data_value(&v1), encode_data_value(&v2));
    }

    #[test]
    fn decode_is_the_inverse_of_encode() {
        let mut map = BTreeMap::new();
        map.insert("pair".to_string(), DataValue::from("SOL/USDC"));
        map.insert("size".to_string(), DataValue::from(10.5));
        map.insert("confirmed".to_string(), DataValue::Bool(true));
        map.insert(
            "tags".to_string(),
            DataValue::Array(vec![DataValue::from("buy"), DataValue::Null]),
        );
        let value = DataValue::Map(map);

        let encoded = encode_data_value(&value);
        let decoded = decode_data_value(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let encoded = encode_data_value(&DataValue::from("hello"));
        let truncated = &encoded[..encoded.len() - 1];
        assert!(decode_data_value(truncated).is_err());
    }
}
