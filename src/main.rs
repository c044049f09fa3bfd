// =============================================================================
// Cascade Hunter — Main Entry Point
// =============================================================================
//
// Polls Hyperliquid public data, derives liquidation-cascade signals, and
// hands qualifying decisions to the configured executor.  Starts in Alert
// mode unless the config says otherwise.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod config;
mod engine;
mod execution;
mod hyperliquid;
mod market_data;
mod signals;
mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::engine::CascadeEngine;
use crate::execution::create_executor;
use crate::hyperliquid::HyperliquidClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Cascade Hunter — Starting Up                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var("CASCADE_CONFIG").unwrap_or_else(|_| "cascade_config.json".into());

    let mut config = Config::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    // Override coins from env if available.
    if let Ok(coins) = std::env::var("CASCADE_COINS") {
        config.coins = coins
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // Misconfiguration is a startup error, not a per-cycle surprise.
    config.validate()?;

    info!(
        mode = %config.mode,
        coins = ?config.coins,
        whale_wallets = config.whale_wallets.len(),
        "Configured"
    );
    info!(
        capital = format!("${:.0}", config.total_capital_usd),
        position_size_pct = config.execution.position_size_pct,
        poll_interval_secs = config.poll_interval_secs,
        "Capital & cadence"
    );

    // ── 2. Build the engine ──────────────────────────────────────────────
    let client = HyperliquidClient::new();
    let executor = create_executor(config.mode);
    let poll_interval = std::time::Duration::from_secs(config.poll_interval_secs);
    let mut engine = CascadeEngine::new(client, config, executor);

    // ── 3. Cooperative shutdown flag ─────────────────────────────────────
    // Set by Ctrl+C; checked between cycles and during the inter-cycle
    // sleep, so in-flight work finishes but no new cycle starts.
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_notify = Arc::new(Notify::new());
    {
        let shutdown = shutdown.clone();
        let notify = shutdown_notify.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Shutdown signal received — finishing current cycle");
                shutdown.store(true, Ordering::SeqCst);
                notify.notify_waiters();
            }
        });
    }

    // ── 4. Poll loop ─────────────────────────────────────────────────────
    info!("Engine running. Press Ctrl+C to stop.");

    while !shutdown.load(Ordering::SeqCst) {
        engine.run_cycle().await;

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            _ = shutdown_notify.notified() => {}
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }

    info!("Cascade Hunter stopped.");
    Ok(())
}
