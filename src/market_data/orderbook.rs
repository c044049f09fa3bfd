// =============================================================================
// Order Book — L2 snapshot and depth wall detection
// =============================================================================
//
// The depth walls feed the optional execution-side confirmation filter: a
// cascade entry wants resting liquidity on the far side of the move.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::hyperliquid::HyperliquidClient;

/// L2 order book snapshot. Levels are `(price, size)` pairs, best first.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub bids: Vec<(f64, f64)>,
    pub asks: Vec<(f64, f64)>,
}

/// A resting liquidity wall.
#[derive(Debug, Clone, Copy)]
pub struct DepthWall {
    pub price: f64,
    pub size: f64,
    /// price * size, in USD.
    pub notional: f64,
}

/// Largest walls on each side, sorted by size descending.
#[derive(Debug, Clone, Default)]
pub struct DepthWalls {
    pub bid_walls: Vec<DepthWall>,
    pub ask_walls: Vec<DepthWall>,
}

impl DepthWalls {
    /// The single largest bid wall, if any.
    pub fn best_bid(&self) -> Option<&DepthWall> {
        self.bid_walls.first()
    }

    /// The single largest ask wall, if any.
    pub fn best_ask(&self) -> Option<&DepthWall> {
        self.ask_walls.first()
    }
}

/// Fetch the L2 book for `coin`.
pub async fn fetch_orderbook(client: &HyperliquidClient, coin: &str) -> Result<OrderBook> {
    let body = client.l2_book(coin).await?;
    let book = parse_l2_book(&body)?;
    debug!(
        coin = %coin,
        bids = book.bids.len(),
        asks = book.asks.len(),
        "order book fetched"
    );
    Ok(book)
}

/// Parse a Hyperliquid `l2Book` response.
///
/// Expected shape: `{"levels": [[{"px": "...", "sz": "..."}, ...], [...]]}`
/// with bids first, asks second.
pub fn parse_l2_book(body: &Value) -> Result<OrderBook> {
    let levels = body["levels"]
        .as_array()
        .context("l2Book response missing levels")?;

    let parse_side = |side: Option<&Value>| -> Vec<(f64, f64)> {
        side.and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|lvl| {
                        let px: f64 = lvl["px"].as_str()?.parse().ok()?;
                        let sz: f64 = lvl["sz"].as_str()?.parse().ok()?;
                        Some((px, sz))
                    })
                    .collect()
            })
            .unwrap_or_default()
    };

    Ok(OrderBook {
        bids: parse_side(levels.first()),
        asks: parse_side(levels.get(1)),
    })
}

/// Find the `top_n` largest resting orders on each side of the book.
pub fn find_depth_walls(book: &OrderBook, top_n: usize) -> DepthWalls {
    let to_walls = |levels: &[(f64, f64)]| -> Vec<DepthWall> {
        let mut walls: Vec<DepthWall> = levels
            .iter()
            .map(|&(price, size)| DepthWall {
                price,
                size,
                notional: price * size,
            })
            .collect();
        walls.sort_by(|a, b| b.size.total_cmp(&a.size));
        walls.truncate(top_n);
        walls
    };

    DepthWalls {
        bid_walls: to_walls(&book.bids),
        ask_walls: to_walls(&book.asks),
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_l2_levels() {
        let body = json!({
            "levels": [
                [ { "px": "96900.0", "sz": "2.5" }, { "px": "96890.0", "sz": "0.4" } ],
                [ { "px": "96910.0", "sz": "1.1" } ]
            ]
        });
        let book = parse_l2_book(&body).unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.asks.len(), 1);
        assert!((book.bids[0].0 - 96900.0).abs() < f64::EPSILON);
    }

    #[test]
    fn walls_sorted_by_size_descending() {
        let book = OrderBook {
            bids: vec![(100.0, 1.0), (99.0, 5.0), (98.0, 3.0)],
            asks: vec![(101.0, 2.0)],
        };
        let walls = find_depth_walls(&book, 2);
        assert_eq!(walls.bid_walls.len(), 2);
        assert!((walls.bid_walls[0].size - 5.0).abs() < f64::EPSILON);
        assert!((walls.bid_walls[0].notional - 495.0).abs() < f64::EPSILON);
        assert!((walls.best_ask().unwrap().size - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_book_yields_no_walls() {
        let walls = find_depth_walls(&OrderBook::default(), 5);
        assert!(walls.best_bid().is_none());
        assert!(walls.best_ask().is_none());
    }
}
