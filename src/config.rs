// =============================================================================
// Configuration — JSON config with serde defaults and atomic save
// =============================================================================
//
// Every field carries `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.  Persistence uses an atomic tmp +
// rename pattern to prevent corruption on crash.
//
// `validate()` runs once at startup: a misconfigured threshold is a process
// error, not something to discover on cycle 400.
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::ExecutorMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_total_capital_usd() -> f64 {
    500.0
}

fn default_coins() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string()]
}

fn default_funding_rate_threshold() -> f64 {
    0.0005
}

fn default_oi_delta_threshold() -> f64 {
    5.0
}

fn default_liquidation_proximity_pct() -> f64 {
    1.5
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_dynamic_window() -> usize {
    96
}

fn default_volume_baseline_usd() -> f64 {
    100_000.0
}

fn default_lookback_hours() -> f64 {
    4.0
}

fn default_position_size_pct() -> f64 {
    20.0
}

fn default_max_positions() -> usize {
    3
}

fn default_take_profit_pct() -> f64 {
    2.0
}

fn default_stop_loss_pct() -> f64 {
    1.0
}

fn default_timeout_minutes() -> f64 {
    30.0
}

fn default_min_size_pct() -> f64 {
    10.0
}

fn default_max_size_pct() -> f64 {
    30.0
}

// =============================================================================
// SignalConfig
// =============================================================================

/// Thresholds and windows consumed by the signal pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Base funding-rate magnitude (decimal, e.g. 0.0005 = 0.05%) below which
    /// no funding signal fires.  The adaptive layer can only raise this.
    #[serde(default = "default_funding_rate_threshold")]
    pub funding_rate_threshold: f64,

    /// Base open-interest delta magnitude (percent) below which no OI
    /// divergence signal fires.
    #[serde(default = "default_oi_delta_threshold")]
    pub oi_delta_threshold: f64,

    /// Maximum distance (percent of current price) at which a liquidation
    /// cluster still counts as "nearby".
    #[serde(default = "default_liquidation_proximity_pct")]
    pub liquidation_proximity_pct: f64,

    /// Minimum aggregated confidence for a decision to reach the executor.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Rolling-history length for the dynamic funding threshold.
    #[serde(default = "default_dynamic_window")]
    pub dynamic_funding_window: usize,

    /// Rolling-history length for the dynamic OI-delta threshold.
    #[serde(default = "default_dynamic_window")]
    pub dynamic_oi_window: usize,

    /// Cluster volume (USD) considered "significant" when scoring
    /// liquidation proximity.
    #[serde(default = "default_volume_baseline_usd")]
    pub volume_baseline_usd: f64,

    /// Minimum order-book wall notional (USD) required on the cascade side
    /// before executing.  0 disables the wall confirmation filter.
    #[serde(default)]
    pub min_wall_notional: f64,

    /// Lookback window (hours) for OI and price delta calculations.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            funding_rate_threshold: default_funding_rate_threshold(),
            oi_delta_threshold: default_oi_delta_threshold(),
            liquidation_proximity_pct: default_liquidation_proximity_pct(),
            min_confidence: default_min_confidence(),
            dynamic_funding_window: default_dynamic_window(),
            dynamic_oi_window: default_dynamic_window(),
            volume_baseline_usd: default_volume_baseline_usd(),
            min_wall_notional: 0.0,
            lookback_hours: default_lookback_hours(),
        }
    }
}

// =============================================================================
// ExecutionConfig
// =============================================================================

/// Parameters handed to the executor with each decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Position size as a percentage of total capital.
    #[serde(default = "default_position_size_pct")]
    pub position_size_pct: f64,

    /// Maximum number of concurrently open positions.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,

    /// Take-profit distance as a percentage of entry price.
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,

    /// Stop-loss distance as a percentage of entry price.
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,

    /// Maximum holding time (minutes) before a position is closed.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: f64,

    /// Scale position size with decision confidence instead of using the
    /// flat `position_size_pct`.
    #[serde(default)]
    pub size_by_confidence: bool,

    /// Size floor (percent of capital) at confidence 0 when scaling.
    #[serde(default = "default_min_size_pct")]
    pub min_size_pct: f64,

    /// Size ceiling (percent of capital) at confidence 1 when scaling.
    #[serde(default = "default_max_size_pct")]
    pub max_size_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            position_size_pct: default_position_size_pct(),
            max_positions: default_max_positions(),
            take_profit_pct: default_take_profit_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            timeout_minutes: default_timeout_minutes(),
            size_by_confidence: false,
            min_size_pct: default_min_size_pct(),
            max_size_pct: default_max_size_pct(),
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// Top-level configuration for the Cascade Hunter engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Executor variant: Alert (log only), Paper (simulated), Live.
    #[serde(default)]
    pub mode: ExecutorMode,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Total capital (USD) the sizing logic allocates from.
    #[serde(default = "default_total_capital_usd")]
    pub total_capital_usd: f64,

    /// Coins the engine watches.
    #[serde(default = "default_coins")]
    pub coins: Vec<String>,

    /// Whale wallet addresses scanned for the liquidation map.
    #[serde(default)]
    pub whale_wallets: Vec<String>,

    /// Signal pipeline thresholds.
    #[serde(default)]
    pub signals: SignalConfig,

    /// Execution parameters.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ExecutorMode::Alert,
            poll_interval_secs: default_poll_interval_secs(),
            total_capital_usd: default_total_capital_usd(),
            coins: default_coins(),
            whale_wallets: Vec::new(),
            signals: SignalConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            mode = %config.mode,
            coins = ?config.coins,
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }

    /// Reject misconfiguration at startup rather than per cycle.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be positive");
        }
        if self.total_capital_usd <= 0.0 {
            bail!("total_capital_usd must be positive");
        }
        if self.coins.is_empty() {
            bail!("at least one coin must be configured");
        }

        let s = &self.signals;
        if s.funding_rate_threshold <= 0.0 {
            bail!("signals.funding_rate_threshold must be positive");
        }
        if s.oi_delta_threshold <= 0.0 {
            bail!("signals.oi_delta_threshold must be positive");
        }
        if s.liquidation_proximity_pct <= 0.0 {
            bail!("signals.liquidation_proximity_pct must be positive");
        }
        if !(0.0..=1.0).contains(&s.min_confidence) {
            bail!("signals.min_confidence must be within [0, 1]");
        }
        if s.dynamic_funding_window == 0 || s.dynamic_oi_window == 0 {
            bail!("dynamic threshold windows must be at least 1");
        }
        if s.volume_baseline_usd <= 0.0 {
            bail!("signals.volume_baseline_usd must be positive");
        }
        if s.lookback_hours <= 0.0 {
            bail!("signals.lookback_hours must be positive");
        }

        let e = &self.execution;
        if e.max_positions == 0 {
            bail!("execution.max_positions must be at least 1");
        }
        if e.position_size_pct <= 0.0 {
            bail!("execution.position_size_pct must be positive");
        }
        if e.take_profit_pct <= 0.0 || e.stop_loss_pct <= 0.0 {
            bail!("take_profit_pct and stop_loss_pct must be positive");
        }
        if e.timeout_minutes <= 0.0 {
            bail!("execution.timeout_minutes must be positive");
        }
        if e.size_by_confidence && e.min_size_pct > e.max_size_pct {
            bail!("execution.min_size_pct must not exceed max_size_pct");
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = Config::default();
        assert_eq!(cfg.mode, ExecutorMode::Alert);
        assert_eq!(cfg.poll_interval_secs, 30);
        assert_eq!(cfg.coins, vec!["BTC", "ETH"]);
        assert!(cfg.whale_wallets.is_empty());
        assert!((cfg.signals.funding_rate_threshold - 0.0005).abs() < f64::EPSILON);
        assert!((cfg.signals.oi_delta_threshold - 5.0).abs() < f64::EPSILON);
        assert!((cfg.signals.liquidation_proximity_pct - 1.5).abs() < f64::EPSILON);
        assert!((cfg.signals.min_confidence - 0.6).abs() < f64::EPSILON);
        assert_eq!(cfg.signals.dynamic_funding_window, 96);
        assert_eq!(cfg.signals.dynamic_oi_window, 96);
        assert_eq!(cfg.execution.max_positions, 3);
        assert!(!cfg.execution.size_by_confidence);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.mode, ExecutorMode::Alert);
        assert_eq!(cfg.poll_interval_secs, 30);
        assert!((cfg.signals.volume_baseline_usd - 100_000.0).abs() < f64::EPSILON);
        assert!((cfg.execution.stop_loss_pct - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "mode": "paper", "coins": ["SOL"], "signals": { "min_confidence": 0.7 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.mode, ExecutorMode::Paper);
        assert_eq!(cfg.coins, vec!["SOL"]);
        assert!((cfg.signals.min_confidence - 0.7).abs() < f64::EPSILON);
        assert!((cfg.signals.oi_delta_threshold - 5.0).abs() < f64::EPSILON);
        assert_eq!(cfg.execution.max_positions, 3);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.coins, cfg2.coins);
        assert_eq!(cfg.mode, cfg2.mode);
        assert_eq!(cfg.signals.dynamic_oi_window, cfg2.signals.dynamic_oi_window);
    }

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_nonpositive_proximity() {
        let mut cfg = Config::default();
        cfg.signals.liquidation_proximity_pct = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let mut cfg = Config::default();
        cfg.signals.min_confidence = 1.2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_size_bounds() {
        let mut cfg = Config::default();
        cfg.execution.size_by_confidence = true;
        cfg.execution.min_size_pct = 40.0;
        cfg.execution.max_size_pct = 30.0;
        assert!(cfg.validate().is_err());
    }
}
