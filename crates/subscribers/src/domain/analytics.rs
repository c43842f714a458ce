//! In-memory trade analytics. All mutation happens through a single
//! RW-lock-guarded counter struct; `stats()` takes only the read lock.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

const ROLLING_WINDOW: Duration = Duration::from_secs(60);
const EMA_ALPHA: f64 = 0.1;

#[derive(Debug, Default)]
struct Counters {
    total_trades: u64,
    buy_count: u64,
    sell_count: u64,
    volume_per_pair: HashMap<String, f64>,
    recent_trade_times: VecDeque<SystemTime>,
    ema_execution_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSnapshot {
    pub total_trades: u64,
    pub buy_count: u64,
    pub sell_count: u64,
    pub volume_per_pair: HashMap<String, f64>,
    pub trades_per_second_60s: f64,
    pub ema_execution_ms: Option<f64>,
}

pub struct AnalyticsAggregator {
    counters: RwLock<Counters>,
}

impl Default for AnalyticsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
        }
    }

    pub fn record_trade(&self, pair: &str, direction: &str, size: f64, execution_ms: i64) {
        let mut counters = self.counters.write().unwrap();
        counters.total_trades += 1;
        if direction.eq_ignore_ascii_case("buy") {
            counters.buy_count += 1;
        } else if direction.eq_ignore_ascii_case("sell") {
            counters.sell_count += 1;
        }
        *counters.volume_per_pair.entry(pair.to_string()).or_insert(0.0) += size;

        let now = SystemTime::now();
        counters.recent_trade_times.push_back(now);
        prune_older_than(&mut counters.recent_trade_times, now, ROLLING_WINDOW);

        let sample = execution_ms as f64;
        counters.ema_execution_ms = Some(match counters.ema_execution_ms {
            Some(prev) => EMA_ALPHA * sample + (1.0 - EMA_ALPHA) * prev,
            None => sample,
        });
    }

    #[must_use]
    pub fn stats(&self) -> AnalyticsSnapshot {
        let mut counters = self.counters.write().unwrap();
        let now = SystemTime::now();
        prune_older_than(&mut counters.recent_trade_times, now, ROLLING_WINDOW);
        let trades_per_second_60s =
            counters.recent_trade_times.len() as f64 / ROLLING_WINDOW.as_secs_f64();

        AnalyticsSnapshot {
            total_trades: counters.total_trades,
            buy_count: counters.buy_count,
            sell_count: counters.sell_count,
            volume_per_pair: counters.volume_per_pair.clone(),
            trades_per_second_60s,
            ema_execution_ms: counters.ema_execution_ms,
        }
    }
}

fn prune_older_than(times: &mut VecDeque<SystemTime>, now: SystemTime, window: Duration) {
    while let Some(&front) = times.front() {
        match now.duration_since(front) {
            Ok(age) if age > window => {
                times.pop_front();
            }
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_buy_and_sell_counts_and_volume() {
        let aggregator = AnalyticsAggregator::new();
        aggregator.record_trade("SOL/USDC", "BUY", 10.0, 50);
        aggregator.record_trade("SOL/USDC", "SELL", 5.0, 30);
        aggregator.record_trade("BTC/USDC", "buy", 1.0, 100);

        let stats = aggregator.stats();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.buy_count, 2);
        assert_eq!(stats.sell_count, 1);
        assert_eq!(stats.volume_per_pair.get("SOL/USDC"), Some(&15.0));
        assert_eq!(stats.volume_per_pair.get("BTC/USDC"), Some(&1.0));
    }

    #[test]
    fn ema_blends_execution_time_samples() {
        let aggregator = AnalyticsAggregator::new();
        aggregator.record_trade("SOL/USDC", "buy", 1.0, 100);
        aggregator.record_trade("SOL/USDC", "buy", 1.0, 200);

        let stats = aggregator.stats();
        // ema = 0.1*200 + 0.9*100 = 110
        assert_eq!(stats.ema_execution_ms, Some(110.0));
    }

    #[test]
    fn recent_trades_drive_the_rolling_rate() {
        let aggregator = AnalyticsAggregator::new();
        for _ in 0..10 {
            aggregator.record_trade("SOL/USDC", "buy", 1.0, 10);
        }
        let stats = aggregator.stats();
        assert!(stats.trades_per_second_60s > 0.0);
    }
}
