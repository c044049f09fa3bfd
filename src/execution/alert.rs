// =============================================================================
// Alert Executor — logs signals, trades nothing
// =============================================================================

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::config::ExecutionConfig;
use crate::execution::{Executor, TradeRecord};
use crate::signals::Decision;
use crate::types::Direction;

/// One emitted alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    pub coin: String,
    pub direction: Direction,
    pub confidence: f64,
    pub allocated_capital: f64,
    pub target_price: Option<f64>,
    pub signals: Vec<&'static str>,
}

/// Executor that only logs decisions. Keeps an in-memory alert history.
#[derive(Debug, Default)]
pub struct AlertExecutor {
    alert_history: Vec<AlertRecord>,
}

impl AlertExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts emitted so far this run.
    pub fn alert_history(&self) -> &[AlertRecord] {
        &self.alert_history
    }
}

impl Executor for AlertExecutor {
    fn execute_trade(
        &mut self,
        decision: &Decision,
        capital: f64,
        _config: &ExecutionConfig,
    ) -> Option<TradeRecord> {
        let alert = AlertRecord {
            coin: decision.coin.clone(),
            direction: decision.direction,
            confidence: decision.confidence,
            allocated_capital: capital,
            target_price: decision.target_price,
            signals: decision.signals.names(),
        };

        info!(
            coin = %alert.coin,
            direction = %alert.direction,
            confidence = format!("{:.1}%", alert.confidence * 100.0),
            capital = format!("${capital:.2}"),
            target = ?alert.target_price,
            signals = ?alert.signals,
            "ALERT"
        );

        self.alert_history.push(alert);
        None
    }

    fn check_open_trades(&mut self, _current_prices: &HashMap<String, f64>) -> Vec<TradeRecord> {
        Vec::new()
    }

    fn open_positions(&self) -> Vec<TradeRecord> {
        Vec::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::ActiveSignals;

    fn decision() -> Decision {
        Decision {
            coin: "BTC".to_string(),
            direction: Direction::Short,
            confidence: 0.8,
            signals: ActiveSignals::default(),
            target_price: Some(95_000.0),
        }
    }

    #[test]
    fn alerts_accumulate_but_no_trades_open() {
        let mut executor = AlertExecutor::new();
        let record = executor.execute_trade(&decision(), 100.0, &ExecutionConfig::default());
        assert!(record.is_none());
        assert_eq!(executor.alert_history().len(), 1);
        assert_eq!(executor.alert_history()[0].target_price, Some(95_000.0));
        assert!(executor.open_positions().is_empty());
        assert!(executor.check_open_trades(&HashMap::new()).is_empty());
    }
}
