//! Recomputation-based verification of a stored span chain.

use crate::hasher::hash_chained;
use trace_types::{Span, ZERO_HASH};

/// Verify a trace's spans, given in position order. Returns `(true, None)`
/// if every span's stored hash matches its recomputed hash and its
/// `previous_hash` matches the predecessor's `sha256`; otherwise `(false,
/// Some(first_bad_position))`.
#[must_use]
pub fn verify_chain(spans_in_position_order: &[Span]) -> (bool, Option<u64>) {
    for (i, span) in spans_in_position_order.iter().enumerate() {
        let recomputed = hash_chained(&span.data_snapshot, &span.previous_hash);
        if recomputed != span.sha256 {
            return (false, Some(span.chain_position));
        }
        let expected_previous = if i == 0 {
            ZERO_HASH
        } else {
            spans_in_position_order[i - 1].sha256
        };
        if span.previous_hash != expected_previous {
            return (false, Some(span.chain_position));
        }
    }
    (true, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::SpanContent;
    use crate::hasher::hash_span;
    use trace_types::{SpanId, SpanStatus, TraceId};

    fn make_span(trace_id: TraceId, position: u64, previous_hash: trace_types::Hash) -> Span {
        let content = SpanContent {
            trace_id,
            chain_position: position,
            name: "step",
            kind: "test",
            start_time_nanos: position as i64,
            end_time_nanos: Some(position as i64 + 1),
            input_snapshot: &[],
            output_snapshot: None,
            reasoning: None,
            confidence: Some(0.5),
            status: SpanStatus::Success,
        };
        let (sha256, data_snapshot) = hash_span(&content, &previous_hash);
        Span {
            id: SpanId::new(),
            trace_id,
            parent_id: None,
            name: "step".to_string(),
            kind: "test".to_string(),
            chain_position: position,
            start_time: std::time::SystemTime::now(),
            end_time: Some(std::time::SystemTime::now()),
            input_snapshot: trace_types::DataValue::Null,
            output_snapshot: None,
            reasoning: None,
            confidence: Some(0.5),
            status: SpanStatus::Success,
            error_message: None,
            sha256,
            previous_hash,
            data_snapshot,
        }
    }

    fn chained_spans(n: u64) -> (TraceId, Vec<Span>) {
        let trace_id = TraceId::new();
        let mut spans = Vec::new();
        let mut previous = ZERO_HASH;
        for i in 0..n {
            let span = make_span(trace_id, i, previous);
            previous = span.sha256;
            spans.push(span);
        }
        (trace_id, spans)
    }

    #[test]
    fn valid_chain_verifies() {
        let (_, spans) = chained_spans(6);
        assert_eq!(verify_chain(&spans), (true, None));
    }

    #[test]
    fn tampering_with_a_span_is_detected_at_its_position() {
        let (_, mut spans) = chained_spans(6);
        spans[3].data_snapshot.push(0xFF);
        assert_eq!(verify_chain(&spans), (false, Some(3)));
    }

    #[test]
    fn broken_previous_hash_link_is_detected() {
        let (_, mut spans) = chained_spans(6);
        spans[4].previous_hash = [0x11u8; 32];
        assert_eq!(verify_chain(&spans), (false, Some(4)));
    }

    #[test]
    fn random_chains_verify_and_tampering_is_always_caught_at_the_tampered_position() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let len = rng.gen_range(1..20u64);
            let (_, spans) = chained_spans(len);
            assert_eq!(verify_chain(&spans), (true, None));

            let mut tampered = spans.clone();
            let position = rng.gen_range(0..len) as usize;
            tampered[position].data_snapshot.push(rng.gen());
            let (valid, first_bad) = verify_chain(&tampered);
            assert!(!valid);
            assert_eq!(first_bad, Some(position as u64));
        }
    }
}
