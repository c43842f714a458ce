//! The contract a strategy producer implements. Strategy evaluation itself
//! is out of scope for this core; `market`/`history` are passed through as
//! the same closed `DataValue` kind used everywhere else rather than a
//! strategy-specific schema, so the orchestrator never needs to know what a
//! given strategy actually consumes.

use std::collections::BTreeMap;
use trace_types::{DataValue, Signal};

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Pure w.r.t. the inputs supplied. Must not block or perform I/O; the
    /// orchestrator calls this synchronously from inside an async context.
    fn analyze(&self, symbol: &str, market: &DataValue, history: &[DataValue]) -> Signal;
}

#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub enabled: bool,
    pub max_daily_trades: u32,
    pub position_size: f64,
    pub risk_per_trade: f64,
    pub parameters: BTreeMap<String, DataValue>,
    pub auto_graduate: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_daily_trades: 0,
            position_size: 0.0,
            risk_per_trade: 0.0,
            parameters: BTreeMap::new(),
            auto_graduate: false,
        }
    }
}
