// =============================================================================
// Funding Rate Snapshot — per-coin funding from metaAndAssetCtxs
// =============================================================================
//
// Hyperliquid returns universe metadata and per-asset contexts as parallel
// arrays; the coin name lives in the metadata, the funding rate in the
// context at the same index.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::hyperliquid::HyperliquidClient;

/// Fetch current funding rates for `coins`. Returns `{coin -> rate}` as a
/// decimal (e.g. 0.0001 = 0.01% per funding interval).
pub async fn fetch_funding_rates(
    client: &HyperliquidClient,
    coins: &[String],
) -> Result<HashMap<String, f64>> {
    let body = client.meta_and_asset_ctxs().await?;
    parse_funding_rates(&body, coins)
}

/// Extract funding rates from a `metaAndAssetCtxs` response body.
pub fn parse_funding_rates(body: &Value, coins: &[String]) -> Result<HashMap<String, f64>> {
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

    let mut rates = HashMap::new();
    for coin in coins {
        let Some(&idx) = coin_index.get(coin.as_str()) else {
            continue;
        };
        let Some(ctx) = ctxs.get(idx) else {
            continue;
        };

        let rate: f64 = ctx["funding"]
            .as_str()
            .unwrap_or("0")
            .parse()
            .unwrap_or(0.0);
        debug!(coin = %coin, rate, "funding rate fetched");
        rates.insert(coin.clone(), rate);
    }

    Ok(rates)
}
