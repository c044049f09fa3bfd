// =============================================================================
// Live Executor — guarded stub for real order placement
// =============================================================================
//
// Placing real orders requires EIP-712 signing against the exchange API,
// which is deliberately out of scope here.  This executor exists so the
// mode wiring is complete; without a key it refuses every decision, and
// with one it still only logs what it *would* do.

use std::collections::HashMap;

use tracing::{error, warn};

use crate::config::ExecutionConfig;
use crate::execution::{Executor, TradeRecord};
use crate::signals::Decision;

/// Live-trading executor. Never places orders in this build.
#[derive(Debug)]
pub struct LiveExecutor {
    private_key: Option<String>,
}

impl LiveExecutor {
    pub fn new(private_key: Option<String>) -> Self {
        if private_key.is_none() {
            warn!("LiveExecutor created without private key - trades will be rejected");
        }
        Self { private_key }
    }
}

impl Executor for LiveExecutor {
    fn execute_trade(
        &mut self,
        decision: &Decision,
        capital: f64,
        _config: &ExecutionConfig,
    ) -> Option<TradeRecord> {
        if self.private_key.is_none() {
            error!(coin = %decision.coin, "cannot execute live trade: no private key configured");
            return None;
        }

        warn!(
            coin = %decision.coin,
            direction = %decision.direction,
            capital = format!("${capital:.2}"),
            "LIVE TRADE (order signing not implemented in this build)"
        );
        None
    }

    fn check_open_trades(&mut self, _current_prices: &HashMap<String, f64>) -> Vec<TradeRecord> {
        Vec::new()
    }

    fn open_positions(&self) -> Vec<TradeRecord> {
        Vec::new()
    }
}
