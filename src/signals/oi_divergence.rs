// =============================================================================
// OI Divergence Signal — open interest building faster than price moves
// =============================================================================
//
// Healthy markets move price together with participation.  OI climbing while
// price stalls means positions are stacking up at levels the market is not
// confirming — fragile structure that unwinds violently:
//
//   OI up, price flat/down          =>  fragile longs  =>  short cascade
//   OI up, price up but lagging OI  =>  still fragile  =>  short cascade
//   price keeping pace with OI      =>  healthy, no signal

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::types::Direction;

/// Fraction of the OI delta that price must keep up with to count as healthy.
const PRICE_KEEPUP_RATIO: f64 = 0.3;

/// OI/price divergence signal for one coin, one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct OiSignal {
    /// Signal strength in [0, 1].
    pub strength: f64,
    /// Predicted cascade direction.
    pub direction: Direction,
    /// OI percent change over the lookback window.
    pub oi_delta: f64,
    /// Price percent change over the same window.
    pub price_delta: f64,
}

/// Evaluate one coin's OI delta against its price delta.
///
/// Returns `None` when `|oi_delta|` is below the threshold, or when price is
/// keeping pace with the OI move.
pub fn oi_divergence_signal(oi_delta: f64, price_delta: f64, threshold: f64) -> Option<OiSignal> {
    let abs_oi = oi_delta.abs();
    if abs_oi < threshold {
        return None;
    }

    // The wider the gap between OI change and price change, the more fragile.
    let divergence = abs_oi - price_delta.abs();
    if divergence <= 0.0 {
        return None;
    }

    let strength = (divergence / (2.0 * threshold)).min(1.0);

    let direction = if price_delta <= 0.0 {
        // OI building while price stalls or falls: longs stacked at bad levels.
        Direction::Short
    } else if price_delta < oi_delta * PRICE_KEEPUP_RATIO {
        // Price rising far slower than participation.
        Direction::Short
    } else {
        return None;
    };

    Some(OiSignal {
        strength,
        direction,
        oi_delta,
        price_delta,
    })
}

/// Evaluate every coin with both deltas available. Coins missing either
/// delta or a threshold entry are skipped.
pub fn evaluate_oi_signals(
    oi_deltas: &HashMap<String, f64>,
    price_deltas: &HashMap<String, f64>,
    thresholds: &HashMap<String, f64>,
) -> HashMap<String, OiSignal> {
    let mut signals = HashMap::new();

    for (coin, &oi_delta) in oi_deltas {
        let Some(&price_delta) = price_deltas.get(coin) else {
            continue;
        };
        let Some(&threshold) = thresholds.get(coin) else {
            continue;
        };

        if let Some(signal) = oi_divergence_signal(oi_delta, price_delta, threshold) {
            info!(
                coin = %coin,
                oi_delta = format!("{oi_delta:.2}"),
                price_delta = format!("{price_delta:.2}"),
                direction = %signal.direction,
                strength = format!("{:.2}", signal.strength),
                "OI divergence signal"
            );
            signals.insert(coin.clone(), signal);
        }
    }

    signals
}
