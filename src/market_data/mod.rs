// =============================================================================
// Market Data Module
// =============================================================================
//
// Poll-cycle data layer over the Hyperliquid info API:
// - Rolling time series for OI / price delta tracking
// - Funding rate and open interest snapshots
// - L2 order book depth walls
// - Whale wallet position scanning

pub mod funding;
pub mod open_interest;
pub mod orderbook;
pub mod rolling_series;
pub mod whale_tracker;

pub use orderbook::{DepthWalls, OrderBook};
pub use rolling_series::RollingSeries;
pub use whale_tracker::WhalePosition;
