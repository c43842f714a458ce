//! Demo entry point: wires the core, runs a single trade-execution trace
//! through it, logs the result, then idles until told to stop.

use anyhow::{Context, Result};
use decision_runtime::{build_core, CoreConfig};
use std::collections::BTreeMap;
use tracer::Ctx;
use trace_types::{DataValue, SpanStatus};

async fn run_demo_trace(core: &decision_runtime::Core) -> Result<()> {
    let ctx = Ctx::new();

    let trace = core
        .tracer
        .start_trace(&ctx, "trade_execution", None)
        .await
        .context("opening demo trace")?;

    let mut input = BTreeMap::new();
    input.insert("symbol".to_string(), DataValue::from("SOL/USDC"));
    input.insert("side".to_string(), DataValue::from("buy"));
    input.insert("amount".to_string(), DataValue::from(10.0));

    let span = core
        .tracer
        .start_span(&ctx, &trace, None, "execute", "trade", DataValue::Map(input))
        .await
        .context("opening demo span")?;

    let mut output = BTreeMap::new();
    output.insert("price".to_string(), DataValue::from(150.00));
    output.insert("fee".to_string(), DataValue::from(1.50));

    core.tracer
        .end_span(
            &ctx,
            &span,
            DataValue::Map(output),
            "test".to_string(),
            0.9,
            SpanStatus::Success,
        )
        .await
        .context("closing demo span")?;

    let closed = core
        .tracer
        .end_trace(
            &ctx,
            &trace,
            Some("trade_executed_successfully".to_string()),
            Some(0.92),
        )
        .await
        .context("closing demo trace")?;

    tracing::info!(
        trace_id = %closed.id,
        merkle_root = ?closed.merkle_root.as_ref().map(trace_types::to_hex),
        status = ?closed.status,
        "demo trace completed"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = decision_telemetry::TelemetryConfig::from_env();
    let _metrics_handle = decision_telemetry::init_telemetry(&telemetry_config)
        .context("initializing telemetry")?;

    let config = CoreConfig::from_env().context("loading core configuration")?;
    let core = build_core(&config).await.context("wiring the decision core")?;

    if let Err(e) = run_demo_trace(&core).await {
        tracing::error!(error = %e, "demo trace failed");
    }

    tracing::info!("decision core is running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    tracing::info!("shutting down");

    let report = core.shutdown().await;
    tracing::info!(drained = report.drained, abandoned = report.abandoned, "anchor worker stopped");

    Ok(())
}
