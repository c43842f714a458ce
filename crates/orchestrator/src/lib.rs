//! Registers strategy producers, gates them on per-strategy enable flags,
//! and publishes their signals and periodic metrics through the Event Bus.
//! Strategy evaluation itself lives entirely outside this crate; the
//! orchestrator only owns the registry, the gating, and the publish
//! contract.

mod error;
mod strategy;

pub use error::OrchestratorError;
pub use strategy::{Strategy, StrategyConfig};

use event_bus::EventBus;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use trace_types::{Action, DataValue, Signal};

struct Entry {
    strategy: Arc<dyn Strategy>,
    config: StrategyConfig,
}

pub struct Orchestrator<B: EventBus + ?Sized> {
    bus: Arc<B>,
    registry: RwLock<HashMap<String, Entry>>,
}

fn action_str(action: Action) -> &'static str {
    match action {
        Action::Buy => "buy",
        Action::Sell => "sell",
        Action::Hold => "hold",
    }
}

fn unix_millis(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

fn signal_to_data_value(strategy: &str, symbol: &str, signal: &Signal) -> DataValue {
    let mut map = BTreeMap::new();
    map.insert("strategy".to_string(), DataValue::from(strategy));
    map.insert("action".to_string(), DataValue::from(action_str(signal.action)));
    map.insert("symbol".to_string(), DataValue::from(symbol));
    map.insert("confidence".to_string(), DataValue::from(signal.confidence));
    map.insert("reasoning".to_string(), DataValue::from(signal.reasoning.clone()));
    map.insert(
        "target_price".to_string(),
        signal.target_price.map(DataValue::from).unwrap_or(DataValue::Null),
    );
    map.insert(
        "stop_loss".to_string(),
        signal.stop_loss.map(DataValue::from).unwrap_or(DataValue::Null),
    );
    map.insert(
        "timestamp".to_string(),
        DataValue::from(unix_millis(SystemTime::now())),
    );
    DataValue::Map(map)
}

impl<B: EventBus + ?Sized + 'static> Orchestrator<B> {
    #[must_use]
    pub fn new(bus: Arc<B>) -> Self {
        Self {
            bus,
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Store `strategy` under its own name, replacing any prior registration
    /// under the same name. Publishes `strategy.registered`.
    pub async fn register(
        &self,
        strategy: Arc<dyn Strategy>,
        config: StrategyConfig,
    ) -> Result<(), OrchestratorError> {
        let name = strategy.name().to_string();
        self.registry
            .write()
            .await
            .insert(name.clone(), Entry { strategy, config });
        self.bus
            .publish("strategy.registered", &DataValue::from(name.as_str()))
            .await?;
        Ok(())
    }

    pub async fn unregister(&self, name: &str) -> Result<(), OrchestratorError> {
        self.registry
            .write()
            .await
            .remove(name)
            .ok_or_else(|| OrchestratorError::NotFound(name.to_string()))?;
        self.bus
            .publish("strategy.unregistered", &DataValue::from(name))
            .await?;
        Ok(())
    }

    /// Idempotent: setting an already-matching enable flag is a no-op beyond
    /// the `strategy.toggled` notification.
    pub async fn toggle(&self, name: &str, enabled: bool) -> Result<(), OrchestratorError> {
        {
            let mut registry = self.registry.write().await;
            let entry = registry
                .get_mut(name)
                .ok_or_else(|| OrchestratorError::NotFound(name.to_string()))?;
            entry.config.enabled = enabled;
        }
        let mut payload = BTreeMap::new();
        payload.insert("strategy".to_string(), DataValue::from(name));
        payload.insert("enabled".to_string(), DataValue::Bool(enabled));
        self.bus
            .publish("strategy.toggled", &DataValue::Map(payload))
            .await?;
        Ok(())
    }

    /// Run every enabled strategy's `analyze` against `market`/`history` and
    /// publish `strategy.<name>.signal` for each successful result. A
    /// strategy that panics is caught, logged, and excluded from the
    /// returned map; the rest still run.
    pub async fn execute_all(
        &self,
        symbol: &str,
        market: &DataValue,
        history: &[DataValue],
    ) -> Result<HashMap<String, Signal>, OrchestratorError> {
        let snapshot: Vec<(String, Arc<dyn Strategy>)> = {
            let registry = self.registry.read().await;
            registry
                .iter()
                .filter(|(_, entry)| entry.config.enabled)
                .map(|(name, entry)| (name.clone(), entry.strategy.clone()))
                .collect()
        };

        let mut results = HashMap::with_capacity(snapshot.len());
        for (name, strategy) in snapshot {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                strategy.analyze(symbol, market, history)
            }));
            let signal = match outcome {
                Ok(signal) => signal,
                Err(_) => {
                    tracing::warn!(strategy = %name, "strategy analyze panicked, skipping");
                    continue;
                }
            };

            let topic = format!("strategy.{name}.signal");
            let payload = signal_to_data_value(&name, symbol, &signal);
            if let Err(e) = self.bus.publish(&topic, &payload).await {
                tracing::warn!(strategy = %name, error = %e, "failed to publish strategy signal");
            }
            results.insert(name, signal);
        }
        Ok(results)
    }

    pub async fn publish_strategy_metrics(
        &self,
        name: &str,
        metrics: DataValue,
    ) -> Result<(), OrchestratorError> {
        let topic = format!("strategy.{name}.metrics");
        self.bus.publish(&topic, &metrics).await?;
        Ok(())
    }

    pub async fn publish_master_metrics(&self, aggregate: DataValue) -> Result<(), OrchestratorError> {
        self.bus.publish("strategy.master.metrics", &aggregate).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::InMemoryEventBus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    struct AlwaysBuy {
        calls: AtomicUsize,
    }

    impl Strategy for AlwaysBuy {
        fn name(&self) -> &str {
            "always_buy"
        }

        fn analyze(&self, _symbol: &str, _market: &DataValue, _history: &[DataValue]) -> Signal {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Signal {
                action: Action::Buy,
                confidence: 80.0,
                reasoning: "test".to_string(),
                target_price: Some(101.0),
                stop_loss: None,
            }
        }
    }

    struct AlwaysPanics;

    impl Strategy for AlwaysPanics {
        fn name(&self) -> &str {
            "always_panics"
        }

        fn analyze(&self, _symbol: &str, _market: &DataValue, _history: &[DataValue]) -> Signal {
            panic!("boom");
        }
    }

    fn bus() -> Arc<InMemoryEventBus> {
        Arc::new(InMemoryEventBus::new(16, Duration::from_millis(100)))
    }

    #[tokio::test]
    async fn execute_all_publishes_a_signal_per_enabled_strategy() {
        let orchestrator = Orchestrator::new(bus());
        let received = Arc::new(Mutex::new(Vec::new()));
        let recv_clone = received.clone();
        orchestrator
            .bus
            .subscribe(
                "strategy.always_buy.signal",
                Arc::new(move |bytes| recv_clone.lock().unwrap().push(bytes)),
            )
            .await
            .unwrap();

        orchestrator
            .register(
                Arc::new(AlwaysBuy { calls: AtomicUsize::new(0) }),
                StrategyConfig::default(),
            )
            .await
            .unwrap();

        let signals = orchestrator
            .execute_all("SOL/USDC", &DataValue::Null, &[])
            .await
            .unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals["always_buy"].action, Action::Buy);

        sleep(Duration::from_millis(20)).await;
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_strategy_does_not_run() {
        let orchestrator = Orchestrator::new(bus());
        orchestrator
            .register(
                Arc::new(AlwaysBuy { calls: AtomicUsize::new(0) }),
                StrategyConfig {
                    enabled: false,
                    ..StrategyConfig::default()
                },
            )
            .await
            .unwrap();

        let signals = orchestrator
            .execute_all("SOL/USDC", &DataValue::Null, &[])
            .await
            .unwrap();
        assert!(signals.is_empty());
    }

    #[tokio::test]
    async fn a_panicking_strategy_does_not_prevent_others_from_running() {
        let orchestrator = Orchestrator::new(bus());
        orchestrator
            .register(Arc::new(AlwaysPanics), StrategyConfig::default())
            .await
            .unwrap();
        orchestrator
            .register(
                Arc::new(AlwaysBuy { calls: AtomicUsize::new(0) }),
                StrategyConfig::default(),
            )
            .await
            .unwrap();

        let signals = orchestrator
            .execute_all("SOL/USDC", &DataValue::Null, &[])
            .await
            .unwrap();
        assert_eq!(signals.len(), 1);
        assert!(signals.contains_key("always_buy"));
    }

    #[tokio::test]
    async fn toggle_is_idempotent_and_gates_execution() {
        let orchestrator = Orchestrator::new(bus());
        orchestrator
            .register(
                Arc::new(AlwaysBuy { calls: AtomicUsize::new(0) }),
                StrategyConfig::default(),
            )
            .await
            .unwrap();

        orchestrator.toggle("always_buy", false).await.unwrap();
        orchestrator.toggle("always_buy", false).await.unwrap();
        let signals = orchestrator
            .execute_all("SOL/USDC", &DataValue::Null, &[])
            .await
            .unwrap();
        assert!(signals.is_empty());

        orchestrator.toggle("always_buy", true).await.unwrap();
        let signals = orchestrator
            .execute_all("SOL/USDC", &DataValue::Null, &[])
            .await
            .unwrap();
        assert_eq!(signals.len(), 1);
    }

    #[tokio::test]
    async fn toggle_unknown_strategy_fails() {
        let orchestrator = Orchestrator::new(bus());
        let err = orchestrator.toggle("ghost", true).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound(_)));
    }
}
