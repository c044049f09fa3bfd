// =============================================================================
// Adaptive Threshold — rolling volatility floor for funding and OI signals
// =============================================================================
//
// A fixed threshold that fires constantly in a hot market is noise.  Each
// tracker keeps a bounded FIFO history of raw per-coin values and loosens
// the effective threshold to 1.5x the mean absolute value once enough
// history exists.  The configured base acts as a hard floor: thresholds
// adapt upward only.

use std::collections::{HashMap, VecDeque};

/// Multiplier applied to the mean absolute history value.
const VOLATILITY_MULTIPLIER: f64 = 1.5;

/// Minimum history length before the threshold adapts.
const MIN_SAMPLES: usize = 5;

/// Per-coin rolling history driving a dynamic threshold floor.
#[derive(Debug)]
pub struct ThresholdTracker {
    base: f64,
    window: usize,
    history: HashMap<String, VecDeque<f64>>,
}

impl ThresholdTracker {
    /// Create a tracker with a configured base threshold and history window.
    pub fn new(base: f64, window: usize) -> Self {
        Self {
            base,
            window,
            history: HashMap::new(),
        }
    }

    /// Append a raw value for `coin`, evicting the oldest once the window
    /// is full.
    pub fn record(&mut self, coin: &str, value: f64) {
        let hist = self.history.entry(coin.to_string()).or_default();
        hist.push_back(value);
        while hist.len() > self.window {
            hist.pop_front();
        }
    }

    /// Effective threshold for `coin` this cycle:
    /// `max(base, mean(|history|) * 1.5)`, or the base alone with fewer
    /// than 5 recorded samples.
    pub fn effective(&self, coin: &str) -> f64 {
        let Some(hist) = self.history.get(coin) else {
            return self.base;
        };
        if hist.len() < MIN_SAMPLES {
            return self.base;
        }

        let mean_abs = hist.iter().map(|v| v.abs()).sum::<f64>() / hist.len() as f64;
        self.base.max(mean_abs * VOLATILITY_MULTIPLIER)
    }

    /// Drop all recorded history.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_threshold_with_no_history() {
        let tracker = ThresholdTracker::new(0.0005, 96);
        assert!((tracker.effective("BTC") - 0.0005).abs() < f64::EPSILON);
    }

    #[test]
    fn base_threshold_under_five_samples() {
        let mut tracker = ThresholdTracker::new(0.0005, 96);
        for _ in 0..4 {
            tracker.record("BTC", 0.01);
        }
        assert!((tracker.effective("BTC") - 0.0005).abs() < f64::EPSILON);
    }

    #[test]
    fn loosens_in_volatile_regime() {
        let mut tracker = ThresholdTracker::new(0.0005, 96);
        for _ in 0..10 {
            tracker.record("BTC", 0.002);
        }
        // mean |history| = 0.002, effective = 0.003.
        assert!((tracker.effective("BTC") - 0.003).abs() < 1e-12);
    }

    #[test]
    fn never_drops_below_base() {
        let mut tracker = ThresholdTracker::new(5.0, 96);
        for _ in 0..20 {
            tracker.record("BTC", 0.1);
        }
        assert!((tracker.effective("BTC") - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_signs_use_absolute_values() {
        let mut tracker = ThresholdTracker::new(0.0001, 96);
        for i in 0..10 {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            tracker.record("BTC", sign * 0.002);
        }
        assert!((tracker.effective("BTC") - 0.003).abs() < 1e-12);
    }

    #[test]
    fn window_evicts_oldest_fifo() {
        let mut tracker = ThresholdTracker::new(0.0001, 5);
        // Five large values, then five small ones push them all out.
        for _ in 0..5 {
            tracker.record("BTC", 1.0);
        }
        for _ in 0..5 {
            tracker.record("BTC", 0.01);
        }
        assert!((tracker.effective("BTC") - 0.015).abs() < 1e-12);
    }

    #[test]
    fn coins_are_independent() {
        let mut tracker = ThresholdTracker::new(0.0005, 96);
        for _ in 0..10 {
            tracker.record("BTC", 0.01);
        }
        assert!(tracker.effective("BTC") > tracker.effective("ETH"));
        assert!((tracker.effective("ETH") - 0.0005).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_restores_base() {
        let mut tracker = ThresholdTracker::new(0.0005, 96);
        for _ in 0..10 {
            tracker.record("BTC", 0.01);
        }
        tracker.reset();
        assert!((tracker.effective("BTC") - 0.0005).abs() < f64::EPSILON);
    }
}
