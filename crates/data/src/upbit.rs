use crate::http::{join, HttpFetcher};
use async_trait::async_trait;
use kimchi_core::numeric::field;
use kimchi_core::{SpotFeed, UpstreamError};
use serde_json::Value;

/// Upbit KRW market for `base_asset` (e.g. "KRW-BTC").
pub fn krw_market(base_asset: &str) -> String {
    format!("KRW-{}", base_asset.to_uppercase())
}

/// `GET /v1/ticker?markets=KRW-BTC` → `[{"market":"KRW-BTC","trade_price":…}]`
pub fn parse_ticker(body: &Value) -> Result<f64, UpstreamError> {
    let first = body
        .as_array()
        .and_then(|tickers| tickers.first())
        .ok_or_else(|| UpstreamError::MalformedPayload("upbit ticker: expected a non-empty array".to_string()))?;
    field(first, "trade_price", "trade_price")
}

/// Upbit spot client (KRW quotes).
pub struct UpbitClient {
    http: HttpFetcher,
    base_url: String,
}

impl UpbitClient {
    pub fn new(http: HttpFetcher, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SpotFeed for UpbitClient {
    fn venue(&self) -> &str {
        "upbit"
    }

    fn currency(&self) -> &str {
        "KRW"
    }

    fn symbol(&self, base_asset: &str) -> String {
        krw_market(base_asset)
    }

    async fn spot_price(&self, base_asset: &str) -> Result<f64, UpstreamError> {
        let market = krw_market(base_asset);
        let body = self
            .http
            .get_json(&join(&self.base_url, "/v1/ticker"), &[("markets", market.as_str())])
            .await?;
        parse_ticker(&body)
    }
}
