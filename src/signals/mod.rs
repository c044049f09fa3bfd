// =============================================================================
// Signals Module
// =============================================================================
//
// The signal evaluation and aggregation pipeline:
// - Funding rate extremity (contrarian: extreme funding predicts a cascade)
// - OI / price divergence (participation building faster than price moves)
// - Liquidation cluster proximity (whale liquidation levels near price)
// - Adaptive thresholds driven by rolling per-coin history
// - Weighted-vote aggregation into ranked trade decisions
//
// Each evaluator is a pure function over the current cycle's data plus
// explicit state objects; a coin with unavailable data is simply absent
// from that evaluator's output map.

pub mod adaptive_threshold;
pub mod aggregator;
pub mod funding;
pub mod liquidation_map;
pub mod oi_divergence;

pub use adaptive_threshold::ThresholdTracker;
pub use aggregator::{aggregate_signals, ActiveSignals, Decision};
pub use funding::{evaluate_funding_signals, FundingSignal};
pub use liquidation_map::{
    build_liquidation_clusters, evaluate_liquidation_signal, LiquidationCluster,
    LiquidationSignal,
};
pub use oi_divergence::{evaluate_oi_signals, OiSignal};
