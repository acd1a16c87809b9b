//! Binance spot and USDⓈ-M futures.

use crate::http::{join, HttpFetcher};
use async_trait::async_trait;
use kimchi_core::numeric::field;
use kimchi_core::{DerivativesFeed, SpotFeed, UpstreamError};
use serde_json::Value;

/// Binance symbol for `base_asset` quoted in USDT (e.g. "BTCUSDT").
pub fn usdt_symbol(base_asset: &str) -> String {
    format!("{}USDT", base_asset.to_uppercase())
}

/// `GET /api/v3/ticker/price` → `{"symbol":"BTCUSDT","price":"…"}`
pub fn parse_ticker_price(body: &Value) -> Result<f64, UpstreamError> {
    field(body, "price", "price")
}

/// `GET /fapi/v1/premiumIndex` → `{"lastFundingRate":"…", …}`
pub fn parse_funding_rate(body: &Value) -> Result<f64, UpstreamError> {
    field(body, "lastFundingRate", "lastFundingRate")
}

/// `GET /fapi/v1/openInterest` → `{"openInterest":"…", …}`
pub fn parse_open_interest(body: &Value) -> Result<f64, UpstreamError> {
    field(body, "openInterest", "openInterest")
}

/// REST client for Binance spot prices and perpetual futures data.
pub struct BinanceClient {
    http: HttpFetcher,
    spot_url: String,
    futures_url: String,
}

impl BinanceClient {
    pub fn new(http: HttpFetcher, spot_url: impl Into<String>, futures_url: impl Into<String>) -> Self {
        Self {
            http,
            spot_url: spot_url.into(),
            futures_url: futures_url.into(),
        }
    }
}

#[async_trait]
impl SpotFeed for BinanceClient {
    fn venue(&self) -> &str {
        "binance"
    }

    fn currency(&self) -> &str {
        "USDT"
    }

    fn symbol(&self, base_asset: &str) -> String {
        usdt_symbol(base_asset)
    }

    async fn spot_price(&self, base_asset: &str) -> Result<f64, UpstreamError> {
        let symbol = usdt_symbol(base_asset);
        let body = self
            .http
            .get_json(&join(&self.spot_url, "/api/v3/ticker/price"), &[("symbol", symbol.as_str())])
            .await?;
        parse_ticker_price(&body)
    }
}

#[async_trait]
impl DerivativesFeed for BinanceClient {
    fn venue(&self) -> &str {
        "binance-futures"
    }

    async fn funding_rate(&self, symbol: &str) -> Result<f64, UpstreamError> {
        let body = self
            .http
            .get_json(&join(&self.futures_url, "/fapi/v1/premiumIndex"), &[("symbol", symbol)])
            .await?;
        parse_funding_rate(&body)
    }

    async fn open_interest(&self, symbol: &str) -> Result<f64, UpstreamError> {
        let body = self
            .http
            .get_json(&join(&self.futures_url, "/fapi/v1/openInterest"), &[("symbol", symbol)])
            .await?;
        parse_open_interest(&body)
    }
}
