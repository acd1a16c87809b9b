use crate::error::UpstreamError;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Refresh Trait
// ---------------------------------------------------------------------------

/// Produces a fresh value for a [`FreshCache`](crate::cache::FreshCache).
#[async_trait]
pub trait Refresh<T>: Send + Sync {
    /// Fetch a new value from upstream.
    ///
    /// `previous` is the last successfully fetched value (of any age), so
    /// sources can carry state forward between fetches.
    async fn refresh(&self, previous: Option<&T>) -> Result<T, UpstreamError>;
}

// ---------------------------------------------------------------------------
// Venue Traits
// ---------------------------------------------------------------------------

/// A venue that quotes a spot price for a base asset.
#[async_trait]
pub trait SpotFeed: Send + Sync {
    /// Venue name (e.g. "binance").
    fn venue(&self) -> &str;

    /// Quote currency the venue prices in.
    fn currency(&self) -> &str;

    /// Venue-specific symbol for `base_asset` (e.g. "BTCUSDT", "KRW-BTC").
    fn symbol(&self, base_asset: &str) -> String;

    /// Latest spot price for `base_asset`.
    async fn spot_price(&self, base_asset: &str) -> Result<f64, UpstreamError>;
}

/// A perpetual futures venue exposing funding and open interest.
#[async_trait]
pub trait DerivativesFeed: Send + Sync {
    fn venue(&self) -> &str;

    /// Last funding rate for `symbol`, as a fraction (0.0001 = 1 bp).
    async fn funding_rate(&self, symbol: &str) -> Result<f64, UpstreamError>;

    /// Current open interest for `symbol`, in contracts.
    async fn open_interest(&self, symbol: &str) -> Result<f64, UpstreamError>;
}

/// A provider of the USD→KRW exchange rate.
#[async_trait]
pub trait FxProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn usd_krw(&self) -> Result<f64, UpstreamError>;
}
