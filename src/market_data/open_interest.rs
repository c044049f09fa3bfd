// =============================================================================
// Open Interest Snapshot — per-coin OI from metaAndAssetCtxs
// =============================================================================
//
// A single snapshot carries no directional information; the engine records
// each snapshot into its OI `RollingSeries` and derives deltas from there.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::hyperliquid::HyperliquidClient;

/// Fetch current open interest for `coins`. Returns `{coin -> oi}` in
/// contract units.
pub async fn fetch_open_interest(
    client: &HyperliquidClient,
    coins: &[String],
) -> Result<HashMap<String, f64>> {
    let body = client.meta_and_asset_ctxs().await?;
    parse_open_interest(&body, coins)
}

/// Extract open interest from a `metaAndAssetCtxs` response body.
pub fn parse_open_interest(body: &Value, coins: &[String]) -> Result<HashMap<String, f64>> {
    let universe = body[0]["universe"]
        .as_array()
        .context("metaAndAssetCtxs response missing universe")?;
    let ctxs = body[1]
        .as_array()
        .context("metaAndAssetCtxs response missing asset contexts")?;

    let coin_index: HashMap<&str, usize> = universe
        .iter()
        .enumerate()
        .filter_map(|(i, asset)| asset["name"].as_str().map(|name| (name, i)))
        .collect();

    let mut oi_data = HashMap::new();
    for coin in coins {
        let Some(&idx) = coin_index.get(coin.as_str()) else {
            continue;
        };
        let Some(ctx) = ctxs.get(idx) else {
            continue;
        };

        let oi: f64 = ctx["openInterest"]
            .as_str()
            .unwrap_or("0")
            .parse()
            .unwrap_or(0.0);
        debug!(coin = %coin, oi, "open interest fetched");
        oi_data.insert(coin.clone(), oi);
    }

    Ok(oi_data)
}
