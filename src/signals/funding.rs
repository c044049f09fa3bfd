// =============================================================================
// Funding Signal — cascade direction from funding rate extremes
// =============================================================================
//
// Funding rates are periodic payments between longs and shorts that anchor
// the perpetual price to spot.  Extreme funding means one side is crowded
// and over-leveraged:
//
//   rate > 0  =>  longs paying  =>  predicted cascade direction: short
//   rate < 0  =>  shorts paying =>  predicted cascade direction: long
//
// Strength scales linearly from 0 at the threshold to 1.0 at 3x threshold.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::types::Direction;

/// Funding extremity signal for one coin, one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct FundingSignal {
    /// Signal strength in [0, 1].
    pub strength: f64,
    /// Predicted cascade direction.
    pub direction: Direction,
    /// The raw funding rate that produced this signal.
    pub rate: f64,
}

/// Evaluate a single funding rate against its effective threshold.
///
/// Returns `None` when `|rate|` sits below the threshold.
pub fn funding_signal(rate: f64, threshold: f64) -> Option<FundingSignal> {
    let abs_rate = rate.abs();
    if abs_rate < threshold {
        return None;
    }

    // 0 at threshold, saturating at 1.0 once |rate| reaches 3x threshold.
    let strength = ((abs_rate - threshold) / (2.0 * threshold)).min(1.0);
    let direction = if rate > 0.0 {
        Direction::Short
    } else {
        Direction::Long
    };

    Some(FundingSignal {
        strength,
        direction,
        rate,
    })
}

/// Evaluate every coin's funding rate against its per-coin effective
/// threshold. Coins without a threshold entry are skipped.
pub fn evaluate_funding_signals(
    funding_rates: &HashMap<String, f64>,
    thresholds: &HashMap<String, f64>,
) -> HashMap<String, FundingSignal> {
    let mut signals = HashMap::new();

    for (coin, &rate) in funding_rates {
        let Some(&threshold) = thresholds.get(coin) else {
            continue;
        };

        if let Some(signal) = funding_signal(rate, threshold) {
            info!(
                coin = %coin,
                rate = format!("{rate:.6}"),
                direction = %signal.direction,
                strength = format!("{:.2}", signal.strength),
                "funding signal"
            );
            signals.insert(coin.clone(), signal);
        }
    }

    signals
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_no_signal() {
        assert!(funding_signal(0.0004, 0.0005).is_none());
        assert!(funding_signal(-0.0004, 0.0005).is_none());
    }

    #[test]
    fn positive_rate_predicts_short_cascade() {
        let sig = funding_signal(0.001, 0.0005).unwrap();
        assert_eq!(sig.direction, Direction::Short);
    }

    #[test]
    fn negative_rate_predicts_long_cascade() {
        let sig = funding_signal(-0.001, 0.0005).unwrap();
        assert_eq!(sig.direction, Direction::Long);
    }

    #[test]
    fn strength_zero_at_threshold() {
        let sig = funding_signal(0.0005, 0.0005).unwrap();
        assert!(sig.strength.abs() < f64::EPSILON);
    }

    #[test]
    fn strength_monotonic_and_saturates_at_3x() {
        let threshold = 0.0005;
        let rates = [0.0006, 0.0008, 0.0010, 0.0012, 0.0015];
        let mut prev = -1.0;
        for rate in rates {
            let s = funding_signal(rate, threshold).unwrap().strength;
            assert!(s >= prev, "strength must be non-decreasing in |rate|");
            prev = s;
        }
        // |rate| = 3x threshold caps at exactly 1.0, as does anything beyond.
        assert!((funding_signal(0.0015, threshold).unwrap().strength - 1.0).abs() < f64::EPSILON);
        assert!((funding_signal(0.01, threshold).unwrap().strength - 1.0).abs() < f64::EPSILON);
        assert!((funding_signal(-0.01, threshold).unwrap().strength - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn map_evaluation_respects_per_coin_thresholds() {
        let rates = HashMap::from([
            ("BTC".to_string(), 0.001),
            ("ETH".to_string(), 0.001),
        ]);
        // Same rate, but ETH's adaptive threshold is too high to fire.
        let thresholds = HashMap::from([
            ("BTC".to_string(), 0.0005),
            ("ETH".to_string(), 0.002),
        ]);

        let signals = evaluate_funding_signals(&rates, &thresholds);
        assert!(signals.contains_key("BTC"));
        assert!(!signals.contains_key("ETH"));
    }
}
