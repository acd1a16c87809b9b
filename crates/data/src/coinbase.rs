use crate::http::{join, HttpFetcher};
use async_trait::async_trait;
use kimchi_core::numeric::field;
use kimchi_core::{SpotFeed, UpstreamError};
use serde_json::Value;

/// Coinbase currency pair for `base_asset` (e.g. "BTC-USD").
pub fn usd_pair(base_asset: &str) -> String {
    format!("{}-USD", base_asset.to_uppercase())
}

/// `GET /v2/prices/BTC-USD/spot` → `{"data":{"amount":"…","currency":"USD"}}`
pub fn parse_spot(body: &Value) -> Result<f64, UpstreamError> {
    let data = body
        .get("data")
        .ok_or_else(|| UpstreamError::MalformedPayload("coinbase spot: missing `data`".to_string()))?;
    field(data, "amount", "amount")
}

/// Coinbase spot client (USD quotes).
pub struct CoinbaseClient {
    http: HttpFetcher,
    base_url: String,
}

impl CoinbaseClient {
    pub fn new(http: HttpFetcher, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SpotFeed for CoinbaseClient {
    fn venue(&self) -> &str {
        "coinbase"
    }

    fn currency(&self) -> &str {
        "USD"
    }

    fn symbol(&self, base_asset: &str) -> String {
        usd_pair(base_asset)
    }

    async fn spot_price(&self, base_asset: &str) -> Result<f64, UpstreamError> {
        let path = format!("/v2/prices/{}/spot", usd_pair(base_asset));
        let body = self.http.get_json(&join(&self.base_url, &path), &[]).await?;
        parse_spot(&body)
    }
}
