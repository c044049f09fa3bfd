// =============================================================================
// Paper Executor — simulated fills with virtual PnL tracking
// =============================================================================
//
// Entry price is captured on the first price check after the trade opens
// (one poll cycle later), mirroring how a market order placed now would
// fill.  Exits: take-profit, stop-loss, or holding timeout.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use crate::config::ExecutionConfig;
use crate::execution::{Executor, ExitReason, TradeRecord};
use crate::signals::Decision;
use crate::types::Direction;

/// Simulated trade executor.
#[derive(Debug, Default)]
pub struct PaperExecutor {
    open_trades: Vec<TradeRecord>,
    closed_trades: Vec<TradeRecord>,
    total_pnl: f64,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative realised PnL (USD) across closed trades.
    pub fn total_pnl(&self) -> f64 {
        self.total_pnl
    }

    /// All closed trades this run.
    pub fn closed_trades(&self) -> &[TradeRecord] {
        &self.closed_trades
    }
}

impl Executor for PaperExecutor {
    fn execute_trade(
        &mut self,
        decision: &Decision,
        capital: f64,
        config: &ExecutionConfig,
    ) -> Option<TradeRecord> {
        let trade = TradeRecord::open(decision, capital, config);

        info!(
            coin = %trade.coin,
            direction = %trade.direction,
            capital = format!("${capital:.2}"),
            confidence = format!("{:.1}%", trade.confidence * 100.0),
            "PAPER TRADE"
        );

        self.open_trades.push(trade.clone());
        Some(trade)
    }

    fn check_open_trades(&mut self, current_prices: &HashMap<String, f64>) -> Vec<TradeRecord> {
        let mut closed = Vec::new();
        let mut still_open = Vec::new();

        for mut trade in self.open_trades.drain(..) {
            let Some(&price) = current_prices.get(&trade.coin) else {
                still_open.push(trade);
                continue;
            };

            // First check after entry: fill at current price.
            let Some(entry) = trade.entry_price else {
                trade.entry_price = Some(price);
                still_open.push(trade);
                continue;
            };

            let pnl_pct = match trade.direction {
                Direction::Long => (price - entry) / entry * 100.0,
                Direction::Short => (entry - price) / entry * 100.0,
            };

            let elapsed_min =
                (Utc::now() - trade.entry_time).num_seconds() as f64 / 60.0;

            let reason = if pnl_pct >= trade.take_profit_pct {
                Some(ExitReason::TakeProfit)
            } else if pnl_pct <= -trade.stop_loss_pct {
                Some(ExitReason::StopLoss)
            } else if elapsed_min >= trade.timeout_minutes {
                Some(ExitReason::Timeout)
            } else {
                None
            };

            let Some(reason) = reason else {
                still_open.push(trade);
                continue;
            };

            let pnl_usd = trade.entry_capital * pnl_pct / 100.0;
            trade.exit_price = Some(price);
            trade.exit_time = Some(Utc::now());
            trade.exit_reason = Some(reason);
            trade.pnl_pct = Some(pnl_pct);
            trade.pnl_usd = Some(pnl_usd);

            self.total_pnl += pnl_usd;

            info!(
                coin = %trade.coin,
                direction = %trade.direction,
                reason = %reason,
                pnl_pct = format!("{pnl_pct:+.2}%"),
                pnl_usd = format!("{pnl_usd:+.2}"),
                total_pnl = format!("{:+.2}", self.total_pnl),
                "PAPER CLOSE"
            );

            self.closed_trades.push(trade.clone());
            closed.push(trade);
        }

        self.open_trades = still_open;
        closed
    }

    fn open_positions(&self) -> Vec<TradeRecord> {
        self.open_trades.clone()
    }
}
