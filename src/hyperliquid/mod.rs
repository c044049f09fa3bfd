// =============================================================================
// Hyperliquid Module
// =============================================================================

pub mod client;

pub use client::HyperliquidClient;
