//! The contract a strategy returns from `analyze`, consumed by the
//! orchestrator. Strategies themselves are out of scope; only this return
//! shape is part of the core.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub action: Action,
    /// Confidence in [0, 100], matching the source system's scale (distinct
    /// from the [0, 1] confidence used on spans and traces).
    pub confidence: f64,
    pub reasoning: String,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
}
