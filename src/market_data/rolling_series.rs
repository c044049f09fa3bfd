// =============================================================================
// Rolling Series — fixed-window delta tracker for price and open interest
// =============================================================================
//
// Coin-keyed store of timestamped samples with a 6 hour retention window.
// Backs the percent-delta queries used by the OI divergence signal.  One
// instance per metric: price and open interest never share a store.
//
// "Now" for a delta query is the latest sample's timestamp, not the wall
// clock, so repeated queries with no intervening record return identical
// results.
// =============================================================================

use std::collections::{HashMap, VecDeque};

/// Retention window for recorded samples (seconds).
pub const RETENTION_SECS: f64 = 6.0 * 3600.0;

/// Tolerance band below the lookback cutoff when picking a baseline sample
/// (seconds).  Absorbs irregular poll intervals.
const BASELINE_TOLERANCE_SECS: f64 = 300.0;

/// A single timestamped observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Unix timestamp, seconds.
    pub timestamp: f64,
    pub value: f64,
}

/// Coin-keyed rolling sample store.
///
/// Samples must be recorded in timestamp order; the engine records once per
/// poll cycle, which guarantees this.
#[derive(Debug, Default)]
pub struct RollingSeries {
    samples: HashMap<String, VecDeque<Sample>>,
}

impl RollingSeries {
    pub fn new() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }

    /// Append a sample for `key` and drop everything older than the
    /// retention window relative to the new timestamp.
    pub fn record(&mut self, key: &str, timestamp: f64, value: f64) {
        let series = self.samples.entry(key.to_string()).or_default();
        series.push_back(Sample { timestamp, value });

        let cutoff = timestamp - RETENTION_SECS;
        while series.front().is_some_and(|s| s.timestamp <= cutoff) {
            series.pop_front();
        }
    }

    /// Percent change between the latest sample and a baseline roughly
    /// `lookback_hours` older.
    ///
    /// The baseline is the oldest sample inside the tolerance band
    /// `[latest - lookback - 5min, latest - lookback]`; when no sample falls
    /// in the band, the oldest retained sample is used instead.
    ///
    /// Returns `None` with fewer than 2 samples, or when the baseline value
    /// is exactly zero.
    pub fn delta_pct(&self, key: &str, lookback_hours: f64) -> Option<f64> {
        let series = self.samples.get(key)?;
        if series.len() < 2 {
            return None;
        }

        let latest = *series.back()?;
        let cutoff = latest.timestamp - lookback_hours * 3600.0;

        let baseline = series
            .iter()
            .find(|s| {
                s.timestamp >= cutoff - BASELINE_TOLERANCE_SECS && s.timestamp <= cutoff
            })
            .or_else(|| series.front())
            .copied()?;

        if baseline.value == 0.0 {
            return None;
        }

        Some((latest.value - baseline.value) / baseline.value * 100.0)
    }

    /// Number of retained samples for `key`.
    pub fn len(&self, key: &str) -> usize {
        self.samples.get(key).map_or(0, |s| s.len())
    }

    /// Drop all recorded samples.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: f64 = 3600.0;

    #[test]
    fn delta_requires_two_samples() {
        let mut series = RollingSeries::new();
        assert_eq!(series.delta_pct("BTC", 4.0), None);
        series.record("BTC", 0.0, 100.0);
        assert_eq!(series.delta_pct("BTC", 4.0), None);
    }

    #[test]
    fn delta_zero_baseline_is_unavailable() {
        let mut series = RollingSeries::new();
        series.record("BTC", 0.0, 0.0);
        series.record("BTC", 4.0 * HOUR, 110.0);
        assert_eq!(series.delta_pct("BTC", 4.0), None);
    }

    #[test]
    fn delta_uses_sample_in_tolerance_band() {
        let mut series = RollingSeries::new();
        let now = 10.0 * HOUR;
        // Oldest retained sits outside the band; the 100.0 sample sits
        // 90 seconds below the 4h cutoff, inside the 5-minute band.
        series.record("BTC", now - 5.0 * HOUR, 80.0);
        series.record("BTC", now - 4.0 * HOUR - 90.0, 100.0);
        series.record("BTC", now, 110.0);

        let delta = series.delta_pct("BTC", 4.0).unwrap();
        assert!((delta - 10.0).abs() < 1e-9);
    }

    #[test]
    fn delta_falls_back_to_oldest_retained() {
        let mut series = RollingSeries::new();
        let now = 2.0 * HOUR;
        // Nothing near the 4h cutoff: series only spans 2 hours.
        series.record("BTC", 0.0, 200.0);
        series.record("BTC", now, 150.0);

        let delta = series.delta_pct("BTC", 4.0).unwrap();
        assert!((delta + 25.0).abs() < 1e-9);
    }

    #[test]
    fn record_prunes_beyond_retention() {
        let mut series = RollingSeries::new();
        series.record("BTC", 0.0, 1.0);
        series.record("BTC", 1.0 * HOUR, 2.0);
        series.record("BTC", 7.0 * HOUR, 3.0);
        // Both earlier samples are at least 6h older than the newest.
        assert_eq!(series.len("BTC"), 1);
    }

    #[test]
    fn keys_are_independent() {
        let mut series = RollingSeries::new();
        series.record("BTC", 0.0, 100.0);
        series.record("BTC", HOUR, 110.0);
        series.record("ETH", 0.0, 50.0);
        assert!(series.delta_pct("BTC", 4.0).is_some());
        assert_eq!(series.delta_pct("ETH", 4.0), None);
    }

    #[test]
    fn delta_is_idempotent_without_new_records() {
        let mut series = RollingSeries::new();
        series.record("BTC", 0.0, 100.0);
        series.record("BTC", 4.0 * HOUR, 120.0);
        let first = series.delta_pct("BTC", 4.0);
        let second = series.delta_pct("BTC", 4.0);
        assert_eq!(first, second);
    }

    #[test]
    fn reset_clears_all_keys() {
        let mut series = RollingSeries::new();
        series.record("BTC", 0.0, 100.0);
        series.record("ETH", 0.0, 50.0);
        series.reset();
        assert_eq!(series.len("BTC"), 0);
        assert_eq!(series.len("ETH"), 0);
    }
}
