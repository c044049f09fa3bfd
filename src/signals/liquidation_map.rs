// =============================================================================
// Liquidation Map — clustering whale liquidation prices into cascade zones
// =============================================================================
//
// Two stages, rebuilt from scratch every cycle:
//
//   1. build_liquidation_clusters: bin each whale position's liquidation
//      price into price buckets and accumulate notional per bucket.
//   2. evaluate_liquidation_signal: if a dense cluster sits within the
//      proximity window, emit a signal in the cascade continuation
//      direction.
//
// A cluster of long liquidations below price means a drop would trigger
// forced selling into the move — the trade is to ride it short.  The
// mirror applies to short liquidations above price.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::market_data::WhalePosition;
use crate::types::Direction;

/// Default cluster bin width as a percent of current price.
pub const DEFAULT_BIN_WIDTH_PCT: f64 = 0.5;

/// Weight of cluster proximity vs cluster size when scoring.
const DISTANCE_WEIGHT: f64 = 0.6;
const VOLUME_WEIGHT: f64 = 0.4;

/// Aggregated liquidation exposure at one price bin.
#[derive(Debug, Clone, Serialize)]
pub struct LiquidationCluster {
    /// Bin center price.
    pub price: f64,
    /// Accumulated notional (USD) liquidatable at this level.
    pub volume: f64,
    /// Number of positions contributing to the bin.
    pub count: usize,
    /// Distance from current price, percent.
    pub distance_pct: f64,
    /// Which side gets liquidated at this level: `Long` below current
    /// price, `Short` above.
    pub direction: Direction,
}

/// Liquidation proximity signal for one coin, one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct LiquidationSignal {
    /// Signal strength in [0, 1].
    pub strength: f64,
    /// Predicted cascade direction (inverse of the cluster's side).
    pub direction: Direction,
    /// The cluster's bin price — candidate trade target.
    pub cluster_price: f64,
    pub cluster_volume: f64,
    pub distance_pct: f64,
}

/// Group whale positions' liquidation prices into bins of `bin_width_pct`%
/// of current price, accumulating notional per bin.
///
/// A position's weight is its margin when known, otherwise
/// `|size| * liquidation_price`.  Positions with no (or non-positive)
/// liquidation price are ignored.  Output is sorted by volume descending.
pub fn build_liquidation_clusters(
    positions: &[WhalePosition],
    current_price: f64,
    bin_width_pct: f64,
) -> Vec<LiquidationCluster> {
    if positions.is_empty() || current_price <= 0.0 {
        return Vec::new();
    }

    let bin_size = current_price * bin_width_pct / 100.0;
    let mut bins: HashMap<i64, (f64, usize)> = HashMap::new();

    for pos in positions {
        let Some(liq_px) = pos.liquidation_price else {
            continue;
        };
        if liq_px <= 0.0 {
            continue;
        }

        let volume = if pos.margin_used > 0.0 {
            pos.margin_used
        } else {
            pos.size.abs() * liq_px
        };

        // Nearest-bin rounding.
        let bin = (liq_px / bin_size).round() as i64;
        let entry = bins.entry(bin).or_insert((0.0, 0));
        entry.0 += volume;
        entry.1 += 1;
    }

    let mut clusters: Vec<LiquidationCluster> = bins
        .into_iter()
        .map(|(bin, (volume, count))| {
            let price = bin as f64 * bin_size;
            LiquidationCluster {
                price,
                volume,
                count,
                distance_pct: (price - current_price).abs() / current_price * 100.0,
                direction: if price < current_price {
                    Direction::Long
                } else {
                    Direction::Short
                },
            }
        })
        .collect();

    clusters.sort_by(|a, b| b.volume.total_cmp(&a.volume));
    clusters
}

/// Check whether a dense cluster sits within `proximity_pct` of current
/// price and derive a cascade signal from it.
///
/// `clusters` must be sorted by volume descending (as produced by
/// `build_liquidation_clusters`), so the first nearby cluster is also the
/// densest one.
pub fn evaluate_liquidation_signal(
    clusters: &[LiquidationCluster],
    proximity_pct: f64,
    volume_baseline: f64,
) -> Option<LiquidationSignal> {
    let best = clusters.iter().find(|c| c.distance_pct <= proximity_pct)?;

    // Closer and larger clusters score higher; distance dominates slightly.
    let distance_factor = 1.0 - best.distance_pct / proximity_pct;
    let volume_factor = (best.volume / volume_baseline).min(1.0);
    let strength = distance_factor * DISTANCE_WEIGHT + volume_factor * VOLUME_WEIGHT;

    // A long-liquidation cluster cascades downward: the trade is short.
    let direction = best.direction.inverse();

    let signal = LiquidationSignal {
        strength,
        direction,
        cluster_price: best.price,
        cluster_volume: best.volume,
        distance_pct: best.distance_pct,
    };

    info!(
        cluster_price = format!("{:.2}", best.price),
        distance_pct = format!("{:.2}", best.distance_pct),
        volume = format!("{:.0}", best.volume),
        direction = %direction,
        strength = format!("{:.2}", signal.strength),
        "liquidation signal"
    );

    Some(signal)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn make_positions(liq_prices: &[f64]) -> Vec<WhalePosition> {
        liq_prices
            .iter()
            .map(|&liq_px| WhalePosition {
                coin: "BTC".to_string(),
                size: 1.0,
                entry_price: 100_000.0,
                liquidation_price: Some(liq_px),
                leverage: 10.0,
                unrealized_pnl: 0.0,
                margin_used: 10_000.0,
                wallet: "0xwhale".to_string(),
            })
            .collect()
    }

    fn cluster(price: f64, volume: f64, distance_pct: f64, direction: Direction) -> LiquidationCluster {
        LiquidationCluster {
            price,
            volume,
            count: 1,
            distance_pct,
            direction,
        }
    }

    #[test]
    fn empty_positions_no_clusters() {
        assert!(build_liquidation_clusters(&[], 100_000.0, DEFAULT_BIN_WIDTH_PCT).is_empty());
    }

    #[test]
    fn nonpositive_price_no_clusters() {
        let positions = make_positions(&[95_000.0]);
        assert!(build_liquidation_clusters(&positions, 0.0, DEFAULT_BIN_WIDTH_PCT).is_empty());
    }

    #[test]
    fn nearby_prices_share_a_bin() {
        // Bin width 0.5% of 100k = 500: the three 95k-ish positions group
        // together, the 80k one stands alone with a third of the volume.
        let positions = make_positions(&[95_000.0, 95_100.0, 95_200.0, 80_000.0]);
        let clusters = build_liquidation_clusters(&positions, 100_000.0, DEFAULT_BIN_WIDTH_PCT);

        assert!(clusters.len() >= 2);
        let dense = &clusters[0];
        assert!(dense.price < 96_000.0 && dense.price > 94_000.0);
        let sparse = clusters
            .iter()
            .find(|c| (c.price - 80_000.0).abs() < 500.0)
            .unwrap();
        assert!(dense.volume > sparse.volume);
    }

    #[test]
    fn direction_tags_follow_side_of_price() {
        let positions = make_positions(&[95_000.0, 94_000.0, 105_000.0, 106_000.0]);
        let clusters = build_liquidation_clusters(&positions, 100_000.0, DEFAULT_BIN_WIDTH_PCT);
        for c in &clusters {
            if c.price < 100_000.0 {
                assert_eq!(c.direction, Direction::Long);
            } else {
                assert_eq!(c.direction, Direction::Short);
            }
        }
    }

    #[test]
    fn missing_margin_falls_back_to_notional() {
        let mut positions = make_positions(&[95_000.0]);
        positions[0].margin_used = 0.0;
        positions[0].size = -2.0;
        let clusters = build_liquidation_clusters(&positions, 100_000.0, DEFAULT_BIN_WIDTH_PCT);
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].volume - 2.0 * 95_000.0).abs() < 1.0);
    }

    #[test]
    fn positions_without_liq_price_are_ignored() {
        let mut positions = make_positions(&[95_000.0]);
        positions[0].liquidation_price = None;
        assert!(build_liquidation_clusters(&positions, 100_000.0, DEFAULT_BIN_WIDTH_PCT).is_empty());
    }

    #[test]
    fn nearby_long_cluster_signals_short() {
        let clusters = vec![cluster(99_000.0, 200_000.0, 1.0, Direction::Long)];
        let signal = evaluate_liquidation_signal(&clusters, 1.5, 100_000.0).unwrap();
        assert_eq!(signal.direction, Direction::Short);
        assert!(signal.strength > 0.0);
        assert!((signal.cluster_price - 99_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nearby_short_cluster_signals_long() {
        let clusters = vec![cluster(101_000.0, 150_000.0, 1.0, Direction::Short)];
        let signal = evaluate_liquidation_signal(&clusters, 1.5, 100_000.0).unwrap();
        assert_eq!(signal.direction, Direction::Long);
    }

    #[test]
    fn distant_cluster_no_signal() {
        let clusters = vec![cluster(90_000.0, 500_000.0, 10.0, Direction::Long)];
        assert!(evaluate_liquidation_signal(&clusters, 1.5, 100_000.0).is_none());
    }

    #[test]
    fn densest_nearby_cluster_wins() {
        // Pre-sorted by volume: the 300k cluster is first and nearby, so it
        // wins over the closer-but-smaller one.
        let clusters = vec![
            cluster(99_200.0, 300_000.0, 0.8, Direction::Long),
            cluster(99_800.0, 50_000.0, 0.2, Direction::Long),
        ];
        let signal = evaluate_liquidation_signal(&clusters, 1.5, 100_000.0).unwrap();
        assert!((signal.cluster_volume - 300_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strength_blends_distance_and_volume() {
        // distance_factor = 1 - 0.5/1.5, volume_factor = 0.5.
        let clusters = vec![cluster(99_500.0, 50_000.0, 0.5, Direction::Long)];
        let signal = evaluate_liquidation_signal(&clusters, 1.5, 100_000.0).unwrap();
        let expected = (1.0 - 0.5 / 1.5) * 0.6 + 0.5 * 0.4;
        assert!((signal.strength - expected).abs() < 1e-9);
    }
}
