use std::time::SystemTime;
use trace_types::DataValue;

/// Canonical topic carrying `trade_executed` v1 payloads.
pub const TRADE_EXECUTED_TOPIC: &str = "trade_executed";

/// A structured audit row written for every `trade_executed` event.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRow {
    pub event_type: String,
    pub pair: String,
    pub direction: String,
    pub size: f64,
    pub price: f64,
    pub environment: String,
    pub status: String,
    pub execution_ms: i64,
    pub timestamp: SystemTime,
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradeExecutedDecodeError {
    #[error("payload is not a map")]
    NotAMap,
    #[error("missing or malformed field: {0}")]
    BadField(&'static str),
}

impl AuditRow {
    /// Build a row from a decoded `trade_executed` payload. `raw` is kept
    /// verbatim alongside the structured fields for replay/debugging.
    pub fn from_payload(value: &DataValue, raw: Vec<u8>) -> Result<Self, TradeExecutedDecodeError> {
        let map = match value {
            DataValue::Map(m) => m,
            _ => return Err(TradeExecutedDecodeError::NotAMap),
        };

        let str_field = |key: &'static str| -> Result<String, TradeExecutedDecodeError> {
            match map.get(key) {
                Some(DataValue::Str(s)) => Ok(s.clone()),
                _ => Err(TradeExecutedDecodeError::BadField(key)),
            }
        };
        let num_field = |key: &'static str| -> Result<f64, TradeExecutedDecodeError> {
            match map.get(key) {
                Some(DataValue::Float(f)) => Ok(*f),
                Some(DataValue::Int(i)) => Ok(*i as f64),
                _ => Err(TradeExecutedDecodeError::BadField(key)),
            }
        };
        let int_field = |key: &'static str| -> Result<i64, TradeExecutedDecodeError> {
            match map.get(key) {
                Some(DataValue::Int(i)) => Ok(*i),
                _ => Err(TradeExecutedDecodeError::BadField(key)),
            }
        };

        Ok(Self {
            event_type: "trade_executed".to_string(),
            pair: str_field("symbol")?,
            direction: str_field("side")?,
            size: num_field("amount")?,
            price: num_field("price")?,
            environment: str_field("exchange_id")?,
            status: str_field("status")?,
            execution_ms: int_field("execution_ms")?,
            timestamp: SystemTime::now(),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn payload() -> DataValue {
        let mut map = BTreeMap::new();
        map.insert("trade_id".to_string(), DataValue::from("t-1"));
        map.insert("symbol".to_string(), DataValue::from("SOL/USDC"));
        map.insert("side".to_string(), DataValue::from("BUY"));
        map.insert("amount".to_string(), DataValue::from(10.0));
        map.insert("price".to_string(), DataValue::from(150.0));
        map.insert("exchange_id".to_string(), DataValue::from("mainnet"));
        map.insert("status".to_string(), DataValue::from("confirmed"));
        map.insert("execution_ms".to_string(), DataValue::from(42));
        DataValue::Map(map)
    }

    #[test]
    fn builds_a_row_from_a_well_formed_payload() {
        let row = AuditRow::from_payload(&payload(), vec![1, 2, 3]).unwrap();
        assert_eq!(row.pair, "SOL/USDC");
        assert_eq!(row.direction, "BUY");
        assert_eq!(row.size, 10.0);
        assert_eq!(row.execution_ms, 42);
        assert_eq!(row.raw, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_a_non_map_payload() {
        let err = AuditRow::from_payload(&DataValue::Null, vec![]).unwrap_err();
        assert_eq!(err, TradeExecutedDecodeError::NotAMap);
    }

    #[test]
    fn rejects_a_missing_field() {
        let mut map = BTreeMap::new();
        map.insert("symbol".to_string(), DataValue::from("SOL/USDC"));
        let err = AuditRow::from_payload(&DataValue::Map(map), vec![]).unwrap_err();
        assert_eq!(err, TradeExecutedDecodeError::BadField("side"));
    }
}
