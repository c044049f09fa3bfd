// =============================================================================
// Whale Tracker — liquidation exposure from tracked large wallets
// =============================================================================
//
// Whale wallet positions approximate where aggregate leveraged exposure gets
// force-closed.  Snapshots are rebuilt from scratch every scan; nothing here
// persists between cycles.

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::hyperliquid::HyperliquidClient;

/// One open position from a tracked wallet.
#[derive(Debug, Clone)]
pub struct WhalePosition {
    pub coin: String,
    /// Signed size: positive = long, negative = short.
    pub size: f64,
    pub entry_price: f64,
    /// Absent for positions the exchange reports without a liquidation
    /// price (e.g. fully collateralised).
    pub liquidation_price: Option<f64>,
    pub leverage: f64,
    pub unrealized_pnl: f64,
    pub margin_used: f64,
    pub wallet: String,
}

/// Fetch all open positions for a single wallet.
pub async fn fetch_positions(
    client: &HyperliquidClient,
    wallet: &str,
) -> Result<Vec<WhalePosition>> {
    let state = client.clearinghouse_state(wallet).await?;
    Ok(parse_positions(&state, wallet))
}

/// Parse a `clearinghouseState` response into positions. Zero-size entries
/// are dropped.
pub fn parse_positions(state: &Value, wallet: &str) -> Vec<WhalePosition> {
    let asset_positions = state["assetPositions"].as_array();

    let mut positions = Vec::new();
    for entry in asset_positions.into_iter().flatten() {
        let p = &entry["position"];

        let size: f64 = p["szi"].as_str().unwrap_or("0").parse().unwrap_or(0.0);
        if size == 0.0 {
            continue;
        }

        let liquidation_price = p["liquidationPx"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|px| *px > 0.0);

        let leverage = p["leverage"]["value"].as_f64().unwrap_or(1.0);

        positions.push(WhalePosition {
            coin: p["coin"].as_str().unwrap_or("").to_string(),
            size,
            entry_price: p["entryPx"].as_str().unwrap_or("0").parse().unwrap_or(0.0),
            liquidation_price,
            leverage,
            unrealized_pnl: p["unrealizedPnl"]
                .as_str()
                .unwrap_or("0")
                .parse()
                .unwrap_or(0.0),
            margin_used: p["marginUsed"]
                .as_str()
                .unwrap_or("0")
                .parse()
                .unwrap_or(0.0),
            wallet: wallet.to_string(),
        });
    }

    debug!(wallet = %truncate(wallet), count = positions.len(), "positions parsed");
    positions
}

/// Scan every tracked wallet and group positions by coin.
///
/// A failed wallet degrades to a warning; the scan continues with the rest.
pub async fn scan_whale_wallets(
    client: &HyperliquidClient,
    wallets: &[String],
    coins: &[String],
) -> HashMap<String, Vec<WhalePosition>> {
    let mut result: HashMap<String, Vec<WhalePosition>> =
        coins.iter().map(|c| (c.clone(), Vec::new())).collect();

    for wallet in wallets {
        match fetch_positions(client, wallet).await {
            Ok(positions) => {
                for pos in positions {
                    if let Some(bucket) = result.get_mut(&pos.coin) {
                        bucket.push(pos);
                    }
                }
            }
            Err(e) => {
                warn!(wallet = %truncate(wallet), error = %e, "failed to scan wallet");
            }
        }
    }

    for coin in coins {
        let count = result.get(coin).map_or(0, |v| v.len());
        if count > 0 {
            info!(coin = %coin, count, "whale positions found");
        }
    }

    result
}

fn truncate(wallet: &str) -> &str {
    &wallet[..wallet.len().min(10)]
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_clearinghouse_positions() {
        let state = json!({
            "assetPositions": [
                { "position": {
                    "coin": "BTC", "szi": "1.5", "entryPx": "95000.0",
                    "liquidationPx": "90000.0", "leverage": { "value": 10 },
                    "unrealizedPnl": "1200.0", "marginUsed": "14250.0"
                } },
                { "position": {
                    "coin": "ETH", "szi": "-20.0", "entryPx": "3300.0",
                    "liquidationPx": null, "leverage": { "value": 5 },
                    "unrealizedPnl": "-50.0", "marginUsed": "13200.0"
                } },
                { "position": { "coin": "SOL", "szi": "0", "entryPx": "150.0" } }
            ]
        });

        let positions = parse_positions(&state, "0xabcdef0123456789");
        assert_eq!(positions.len(), 2);

        let btc = &positions[0];
        assert_eq!(btc.coin, "BTC");
        assert!((btc.size - 1.5).abs() < f64::EPSILON);
        assert_eq!(btc.liquidation_price, Some(90000.0));
        assert!((btc.leverage - 10.0).abs() < f64::EPSILON);

        let eth = &positions[1];
        assert!(eth.size < 0.0);
        assert_eq!(eth.liquidation_price, None);
        assert_eq!(eth.wallet, "0xabcdef0123456789");
    }

    #[test]
    fn empty_state_yields_no_positions() {
        assert!(parse_positions(&json!({}), "0x0").is_empty());
    }
}
