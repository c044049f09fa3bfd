// =============================================================================
// Execution Module — pluggable sinks for qualifying trade decisions
// =============================================================================
//
// The signal pipeline hands ranked decisions to an `Executor`; what happens
// next (a log line, a simulated fill, a real order) is the executor's
// business.  The engine only relies on the three-method contract below.

pub mod alert;
pub mod live;
pub mod paper;

pub use alert::AlertExecutor;
pub use live::LiveExecutor;
pub use paper::PaperExecutor;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::ExecutionConfig;
use crate::signals::Decision;
use crate::types::{Direction, ExecutorMode};

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Timeout,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TakeProfit => write!(f, "take_profit"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// A trade owned by an executor, open or closed.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub coin: String,
    pub direction: Direction,
    /// Decision confidence at entry.
    pub confidence: f64,
    /// USD allocated to the trade.
    pub entry_capital: f64,
    pub entry_time: DateTime<Utc>,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub timeout_minutes: f64,
    /// Filled in on the first price check after entry.
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,
    pub pnl_pct: Option<f64>,
    pub pnl_usd: Option<f64>,
}

impl TradeRecord {
    /// Create an open trade from a decision and its allocated capital.
    pub fn open(decision: &Decision, capital: f64, config: &ExecutionConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            coin: decision.coin.clone(),
            direction: decision.direction,
            confidence: decision.confidence,
            entry_capital: capital,
            entry_time: Utc::now(),
            take_profit_pct: config.take_profit_pct,
            stop_loss_pct: config.stop_loss_pct,
            timeout_minutes: config.timeout_minutes,
            entry_price: None,
            exit_price: None,
            exit_time: None,
            exit_reason: None,
            pnl_pct: None,
            pnl_usd: None,
        }
    }
}

/// Trade/alert sink contract the engine dispatches against.
pub trait Executor: Send {
    /// Handle a qualifying decision. Returns the opened trade, or `None`
    /// when the executor does not track trades (or refused).
    fn execute_trade(
        &mut self,
        decision: &Decision,
        capital: f64,
        config: &ExecutionConfig,
    ) -> Option<TradeRecord>;

    /// Re-check open trades against current prices. Returns the trades
    /// closed by this check.
    fn check_open_trades(&mut self, current_prices: &HashMap<String, f64>) -> Vec<TradeRecord>;

    /// Snapshot of currently open positions, for the position limit.
    fn open_positions(&self) -> Vec<TradeRecord>;
}

/// Build the executor for the configured mode.
pub fn create_executor(mode: ExecutorMode) -> Box<dyn Executor> {
    match mode {
        ExecutorMode::Paper => {
            info!("Mode: PAPER TRADING");
            Box::new(PaperExecutor::new())
        }
        ExecutorMode::Live => {
            info!("Mode: LIVE TRADING");
            Box::new(LiveExecutor::new(std::env::var("CASCADE_PRIVATE_KEY").ok()))
        }
        ExecutorMode::Alert => {
            info!("Mode: ALERT ONLY");
            Box::new(AlertExecutor::new())
        }
    }
}
