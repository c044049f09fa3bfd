// =============================================================================
// Hyperliquid Info API Client — public market data over JSON POST
// =============================================================================
//
// Every query goes to the single /info endpoint with a `type` discriminator
// in the body.  All endpoints used here are public: no key, no signing.
// A 10 s timeout bounds worst-case cycle latency; a slow or failed call
// degrades that data source for the cycle instead of wedging the loop.
// =============================================================================

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::debug;

/// Default Hyperliquid info endpoint.
const API_URL: &str = "https://api.hyperliquid.xyz/info";

/// Per-request timeout (seconds).
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Thin client for the Hyperliquid public info API.
#[derive(Clone)]
pub struct HyperliquidClient {
    url: String,
    client: reqwest::Client,
}

impl HyperliquidClient {
    /// Create a client against the production info endpoint.
    pub fn new() -> Self {
        Self::with_url(API_URL)
    }

    /// Create a client against a custom endpoint (tests, mirrors).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("failed to build reqwest client for HyperliquidClient"),
        }
    }

    /// POST `payload` to the info endpoint and return the parsed JSON body.
    async fn post(&self, payload: Value) -> Result<Value> {
        let kind = payload["type"].as_str().unwrap_or("?").to_string();

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("POST info type={kind}"))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse info response for type={kind}"))?;

        if !status.is_success() {
            anyhow::bail!("info API returned {} for type={}: {}", status, kind, body);
        }

        debug!(kind = %kind, "info request complete");
        Ok(body)
    }

    /// Current mid price per coin: `{"BTC": "97123.5", ...}`.
    pub async fn all_mids(&self) -> Result<Value> {
        self.post(json!({ "type": "allMids" })).await
    }

    /// Universe metadata plus per-asset contexts (funding, open interest).
    ///
    /// Returns a two-element array: `[meta, assetCtxs]`.
    pub async fn meta_and_asset_ctxs(&self) -> Result<Value> {
        self.post(json!({ "type": "metaAndAssetCtxs" })).await
    }

    /// L2 order book snapshot for `coin`.
    pub async fn l2_book(&self, coin: &str) -> Result<Value> {
        self.post(json!({ "type": "l2Book", "coin": coin })).await
    }

    /// Full clearinghouse state (open positions, margin) for a wallet.
    pub async fn clearinghouse_state(&self, user: &str) -> Result<Value> {
        self.post(json!({ "type": "clearinghouseState", "user": user }))
            .await
    }
}

impl Default for HyperliquidClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyperliquidClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperliquidClient")
            .field("url", &self.url)
            .finish()
    }
}
