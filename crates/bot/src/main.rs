//! Triangular arbitrage scanner
//!
//! Main entry point: loads configuration, builds quote sources and runs the
//! adaptive scheduler until Ctrl+C / SIGTERM or `max_ticks`.

use anyhow::Context;
use std::env;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use triarb_bot::{dry_run_source, env_flag, rpc_sources, LogReporter, DEFAULT_CONFIG_PATH};
use triarb_core::ScannerConfig;
use triarb_scheduler::Scheduler;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env_flag("TRIARB_LOG_JSON") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received termination signal");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting triarb scanner v{}", env!("CARGO_PKG_VERSION"));

    let path = env::var("TRIARB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let settings = ScannerConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path))?
        .validate()
        .context("invalid configuration")?;

    info!(
        "Loaded {} tokens, {} cycles, {} amounts, {} endpoints (min profit {}%, near floor {}%)",
        settings.registry.len(),
        settings.cycles.len(),
        settings.amounts.len(),
        settings.endpoints.len(),
        settings.thresholds.min_profit_pct,
        settings.thresholds.near_floor_pct
    );
    for cycle in &settings.cycles {
        info!("Cycle {}", cycle);
    }

    let sources = if env_flag("TRIARB_DRY_RUN") {
        warn!("Dry run: quotes come from a simulated market");
        vec![dry_run_source(&settings)]
    } else {
        rpc_sources(&settings).context("failed to create RPC quote sources")?
    };

    let reporter = Arc::new(LogReporter::new(env_flag("TRIARB_REPORT_JSON")));
    let scheduler = Scheduler::new(&settings, sources, reporter)?;

    // Setup stop channel
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    info!("Press Ctrl+C to stop");

    let state = scheduler.run(stop_rx).await;

    info!(
        "Shutdown complete: {} ticks, {} quiet, {} endpoint rotations",
        state.tick, state.quiet_ticks, state.rotations
    );
    Ok(())
}
