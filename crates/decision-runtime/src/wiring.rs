//! Assembles the trace store, tracer, event bus, anchor submitter,
//! orchestrator, and reference subscribers into one running `Core`, the way
//! `SubsystemRegistry::initialize_all` phases construction in the runtime
//! this workspace is descended from: storage first, then the capabilities
//! that depend on it, then the capabilities that depend on those.

use crate::adapters::{LoggingAuditStore, LoggingBroadcastHub};
use crate::config::CoreConfig;
use anchor_submitter::{AnchorSubmitter, MockSubmitter, ShutdownReport};
use event_bus::{EventBus, EventBusConfig};
use orchestrator::Orchestrator;
use std::sync::Arc;
use subscribers::{AnalyticsAggregatorAdapter, AuditPersister, BroadcastRelay};
use tokio::task::JoinHandle;
use trace_store::{FileTraceStore, InMemoryTraceStore, TraceStore};
use tracer::Tracer;

/// Canonical, fixed-name topics a reference broadcast relay forwards.
/// Per-strategy topics (`strategy.<name>.signal`/`.metrics`) are named only
/// after a strategy registers, so a host application that wants those
/// relayed calls `Core::broadcast_relay.attach` again once it knows the
/// names.
pub const RELAYED_TOPICS: &[&str] = &[
    "trade_executed",
    "strategy.registered",
    "strategy.unregistered",
    "strategy.toggled",
    "strategy.master.metrics",
];

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("failed to open trace store at '{0}': {1}")]
    StoreOpen(String, std::io::Error),
    #[error("event bus subscription failed: {0}")]
    Bus(#[from] event_bus::BusError),
}

/// Whether operator credentials were supplied without a real `Submitter`
/// implementation to hand them to. This workspace ships only
/// [`MockSubmitter`]; a host application that links a real one replaces
/// `build_core`'s submitter construction, not this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitterMode {
    Mock,
    CredentialsIgnored,
}

pub struct Core {
    pub store: Arc<dyn TraceStore>,
    pub tracer: Arc<Tracer<dyn TraceStore>>,
    pub bus: Arc<dyn EventBus>,
    pub anchor_submitter: Arc<AnchorSubmitter<dyn TraceStore, MockSubmitter>>,
    pub anchor_worker: JoinHandle<ShutdownReport>,
    pub orchestrator: Arc<Orchestrator<dyn EventBus>>,
    pub audit_store: Arc<LoggingAuditStore>,
    pub broadcast_hub: Arc<LoggingBroadcastHub>,
    pub audit_persister: AuditPersister<LoggingAuditStore>,
    pub analytics: AnalyticsAggregatorAdapter,
    pub broadcast_relay: BroadcastRelay<LoggingBroadcastHub>,
    pub submitter_mode: SubmitterMode,
}

impl Core {
    /// Disconnect the reference subscribers and stop the anchor worker,
    /// draining its queue within the configured grace period.
    pub async fn shutdown(self) -> ShutdownReport {
        self.anchor_submitter.shutdown();
        self.anchor_worker.await.unwrap_or_default()
    }
}

async fn open_store(dsn: &str) -> Result<Arc<dyn TraceStore>, WiringError> {
    if dsn == "memory" || dsn.is_empty() {
        return Ok(Arc::new(InMemoryTraceStore::new()));
    }
    let store = FileTraceStore::open(dsn)
        .await
        .map_err(|e| WiringError::StoreOpen(dsn.to_string(), e))?;
    Ok(Arc::new(store))
}

pub async fn build_core(config: &CoreConfig) -> Result<Core, WiringError> {
    let store = open_store(&config.trace_store_dsn).await?;

    let bus = event_bus::build(&EventBusConfig {
        broker_url: config.eventbus_broker_url.clone(),
        queue_capacity: config.eventbus_queue_capacity,
        publish_timeout: config.eventbus_publish_timeout,
    })
    .await;

    let submitter = Arc::new(MockSubmitter::new(config.anchor_topic_id.clone()));
    let submitter_mode = if config.anchor_operator_id.is_some() && config.anchor_operator_key.is_some() {
        tracing::warn!(
            "ANCHOR_OPERATOR_ID/ANCHOR_OPERATOR_KEY are set but this build only links MockSubmitter; \
             credentials are stored for a real Submitter this workspace doesn't implement"
        );
        SubmitterMode::CredentialsIgnored
    } else {
        SubmitterMode::Mock
    };
    let (anchor_submitter, anchor_worker) = AnchorSubmitter::spawn(
        store.clone(),
        submitter,
        config.anchor_queue_capacity,
        config.anchor_drain_grace,
    );

    let tracer = Arc::new(Tracer::new(store.clone(), Some(anchor_submitter.sink())));
    let orchestrator = Arc::new(Orchestrator::new(bus.clone()));

    let audit_store = Arc::new(LoggingAuditStore::new());
    let audit_persister = AuditPersister::new(audit_store.clone());
    audit_persister.attach(bus.as_ref()).await?;

    let analytics = AnalyticsAggregatorAdapter::new();
    analytics.attach(bus.as_ref()).await?;

    let broadcast_hub = Arc::new(LoggingBroadcastHub::new());
    let broadcast_relay = BroadcastRelay::new(broadcast_hub.clone());
    broadcast_relay.attach(bus.as_ref(), RELAYED_TOPICS).await?;

    Ok(Core {
        store,
        tracer,
        bus,
        anchor_submitter,
        anchor_worker,
        orchestrator,
        audit_store,
        broadcast_hub,
        audit_persister,
        analytics,
        broadcast_relay,
        submitter_mode,
    })
}
