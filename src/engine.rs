// =============================================================================
// Cascade Engine — one poll cycle: fetch, evaluate, aggregate, dispatch
// =============================================================================
//
// Single-threaded, single-cycle-at-a-time: each cycle runs to completion
// before the next begins, so all rolling state is mutated without locks.
//
// Degradation policy: a failed fetch empties that data source for the cycle
// and the pipeline continues with whatever is available.  Nothing inside a
// cycle is fatal, and nothing is retried here — retry/backoff belongs to
// the network layer if anywhere.
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::execution::Executor;
use crate::hyperliquid::HyperliquidClient;
use crate::market_data::orderbook::{fetch_orderbook, find_depth_walls};
use crate::market_data::whale_tracker::scan_whale_wallets;
use crate::market_data::{funding, open_interest, RollingSeries};
use crate::signals::liquidation_map::DEFAULT_BIN_WIDTH_PCT;
use crate::signals::{
    aggregate_signals, build_liquidation_clusters, evaluate_funding_signals,
    evaluate_liquidation_signal, evaluate_oi_signals, Decision, LiquidationSignal,
    ThresholdTracker,
};
use crate::types::Direction;

/// Owns all per-cycle pipeline state and the executor.
pub struct CascadeEngine {
    client: HyperliquidClient,
    config: Config,
    executor: Box<dyn Executor>,
    price_series: RollingSeries,
    oi_series: RollingSeries,
    funding_thresholds: ThresholdTracker,
    oi_thresholds: ThresholdTracker,
    cycle: u64,
}

impl CascadeEngine {
    pub fn new(client: HyperliquidClient, config: Config, executor: Box<dyn Executor>) -> Self {
        let funding_thresholds = ThresholdTracker::new(
            config.signals.funding_rate_threshold,
            config.signals.dynamic_funding_window,
        );
        let oi_thresholds = ThresholdTracker::new(
            config.signals.oi_delta_threshold,
            config.signals.dynamic_oi_window,
        );

        Self {
            client,
            config,
            executor,
            price_series: RollingSeries::new(),
            oi_series: RollingSeries::new(),
            funding_thresholds,
            oi_thresholds,
            cycle: 0,
        }
    }

    fn now_secs() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }

    /// Run one full poll cycle. Never fails: degraded data sources shrink
    /// the signal set, they do not abort the cycle.
    pub async fn run_cycle(&mut self) {
        self.cycle += 1;
        info!(cycle = self.cycle, "--- cycle start ---");

        let coins = self.config.coins.clone();
        let now = Self::now_secs();

        // ── 1. Current prices ────────────────────────────────────────────
        let current_prices = match self.fetch_prices(&coins).await {
            Ok(prices) => prices,
            Err(e) => {
                error!(error = %e, "failed to fetch prices - degrading to empty");
                HashMap::new()
            }
        };
        info!(prices = ?current_prices, "prices");

        for (coin, &price) in &current_prices {
            self.price_series.record(coin, now, price);
        }

        // ── 2. Manage open trades first ──────────────────────────────────
        let closed = self.executor.check_open_trades(&current_prices);
        for trade in &closed {
            info!(
                coin = %trade.coin,
                reason = ?trade.exit_reason,
                pnl_pct = format!("{:+.2}%", trade.pnl_pct.unwrap_or(0.0)),
                "closed"
            );
        }

        // ── 3. Position limit ────────────────────────────────────────────
        let open_positions = self.executor.open_positions();
        let max_positions = self.config.execution.max_positions;
        if open_positions.len() >= max_positions {
            info!(
                open = open_positions.len(),
                max = max_positions,
                "max positions reached, skipping signal evaluation"
            );
            return;
        }

        // ── 4. Funding rates ─────────────────────────────────────────────
        let funding_rates = match funding::fetch_funding_rates(&self.client, &coins).await {
            Ok(rates) => rates,
            Err(e) => {
                error!(error = %e, "failed to fetch funding - degrading to empty");
                HashMap::new()
            }
        };

        // ── 5. Open interest ─────────────────────────────────────────────
        let oi_data = match open_interest::fetch_open_interest(&self.client, &coins).await {
            Ok(oi) => oi,
            Err(e) => {
                error!(error = %e, "failed to fetch OI - degrading to empty");
                HashMap::new()
            }
        };
        for (coin, &oi) in &oi_data {
            self.oi_series.record(coin, now, oi);
        }

        // ── 6. Deltas over the lookback window ───────────────────────────
        let lookback = self.config.signals.lookback_hours;
        let mut oi_deltas = HashMap::new();
        let mut price_deltas = HashMap::new();
        for coin in &coins {
            if let Some(delta) = self.oi_series.delta_pct(coin, lookback) {
                oi_deltas.insert(coin.clone(), delta);
            }
            if let Some(delta) = self.price_series.delta_pct(coin, lookback) {
                price_deltas.insert(coin.clone(), delta);
            }
        }

        // ── 7. Whale scan -> liquidation map ─────────────────────────────
        let mut liq_signals: HashMap<String, LiquidationSignal> = HashMap::new();
        if !self.config.whale_wallets.is_empty() {
            let whale_positions =
                scan_whale_wallets(&self.client, &self.config.whale_wallets, &coins).await;

            for coin in &coins {
                let Some(&price) = current_prices.get(coin) else {
                    continue;
                };
                let Some(positions) = whale_positions.get(coin) else {
                    continue;
                };
                if positions.is_empty() {
                    continue;
                }

                let clusters =
                    build_liquidation_clusters(positions, price, DEFAULT_BIN_WIDTH_PCT);
                if let Some(signal) = evaluate_liquidation_signal(
                    &clusters,
                    self.config.signals.liquidation_proximity_pct,
                    self.config.signals.volume_baseline_usd,
                ) {
                    liq_signals.insert(coin.clone(), signal);
                }
            }
        }

        // ── 8. Adaptive thresholds ───────────────────────────────────────
        for (coin, &rate) in &funding_rates {
            self.funding_thresholds.record(coin, rate);
        }
        for (coin, &delta) in &oi_deltas {
            self.oi_thresholds.record(coin, delta);
        }

        let funding_thr: HashMap<String, f64> = coins
            .iter()
            .map(|c| (c.clone(), self.funding_thresholds.effective(c)))
            .collect();
        let oi_thr: HashMap<String, f64> = coins
            .iter()
            .map(|c| (c.clone(), self.oi_thresholds.effective(c)))
            .collect();

        // ── 9. Evaluate and aggregate ────────────────────────────────────
        let funding_sigs = evaluate_funding_signals(&funding_rates, &funding_thr);
        let oi_sigs = evaluate_oi_signals(&oi_deltas, &price_deltas, &oi_thr);

        let decisions = aggregate_signals(
            &funding_sigs,
            &oi_sigs,
            &liq_signals,
            self.config.signals.min_confidence,
        );

        if decisions.is_empty() {
            info!("no trade signals this cycle");
            return;
        }

        // ── 10. Execute ──────────────────────────────────────────────────
        let slots_available = max_positions - open_positions.len();
        let existing_coins: HashSet<&str> =
            open_positions.iter().map(|p| p.coin.as_str()).collect();

        for decision in decisions.into_iter().take(slots_available) {
            if existing_coins.contains(decision.coin.as_str()) {
                info!(coin = %decision.coin, "already positioned, skipping");
                continue;
            }

            if !self.wall_confirmed(&decision).await {
                continue;
            }

            let trade_capital = self.trade_capital(&decision);
            self.executor
                .execute_trade(&decision, trade_capital, &self.config.execution);
        }
    }

    /// Fetch mid prices for the configured coins.
    async fn fetch_prices(&self, coins: &[String]) -> Result<HashMap<String, f64>> {
        let mids = self.client.all_mids().await?;

        let mut prices = HashMap::new();
        for coin in coins {
            if let Some(price) = mids[coin.as_str()].as_str().and_then(|s| s.parse().ok()) {
                prices.insert(coin.clone(), price);
            }
        }
        Ok(prices)
    }

    /// Depth-wall confirmation: a cascade entry wants a resting wall on the
    /// far side of the move.  Disabled when `min_wall_notional` is 0.
    async fn wall_confirmed(&self, decision: &Decision) -> bool {
        let min_notional = self.config.signals.min_wall_notional;
        if min_notional <= 0.0 {
            return true;
        }

        let book = match fetch_orderbook(&self.client, &decision.coin).await {
            Ok(book) => book,
            Err(e) => {
                warn!(coin = %decision.coin, error = %e, "order book unavailable, skipping trade");
                return false;
            }
        };

        let walls = find_depth_walls(&book, 5);
        let wall = match decision.direction {
            Direction::Long => walls.best_ask(),
            Direction::Short => walls.best_bid(),
        };

        match wall {
            Some(w) if w.notional >= min_notional => true,
            _ => {
                info!(
                    coin = %decision.coin,
                    direction = %decision.direction,
                    min_notional,
                    "no strong wall on the cascade side, skipping"
                );
                false
            }
        }
    }

    /// Capital allocated to one trade, optionally scaled by confidence.
    fn trade_capital(&self, decision: &Decision) -> f64 {
        let capital = self.config.total_capital_usd;
        let exe = &self.config.execution;

        if exe.size_by_confidence {
            let scaled_pct =
                exe.min_size_pct + (exe.max_size_pct - exe.min_size_pct) * decision.confidence;
            capital * scaled_pct / 100.0
        } else {
            capital * exe.position_size_pct / 100.0
        }
    }
}

impl std::fmt::Debug for CascadeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeEngine")
            .field("cycle", &self.cycle)
            .field("coins", &self.config.coins)
            .finish()
    }
}
