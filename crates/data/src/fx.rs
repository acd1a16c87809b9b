//! USD→KRW exchange rate with sequential provider fallback.
//!
//! [`FxChain`] tries each provider in order and returns the first rate that
//! parses. This is separate from the temporal fallback of the cache that
//! wraps it: the chain never serves an old rate, the cache never tries a
//! second provider.

use crate::http::HttpFetcher;
use async_trait::async_trait;
use kimchi_core::numeric::parse_number;
use kimchi_core::{FxProvider, FxQuote, Refresh, UpstreamError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extract `rates.KRW` (key matched case-insensitively).
pub fn parse_krw_rate(body: &Value) -> Result<f64, UpstreamError> {
    let rates = body
        .get("rates")
        .and_then(Value::as_object)
        .ok_or_else(|| UpstreamError::MalformedPayload("fx: missing `rates` object".to_string()))?;

    let raw = rates
        .iter()
        .find(|(currency, _)| currency.eq_ignore_ascii_case("KRW"))
        .map(|(_, raw)| raw)
        .ok_or_else(|| UpstreamError::invalid_field("rates.KRW", "<missing>"))?;

    let rate = parse_number(raw, "rates.KRW")?;
    if rate <= 0.0 {
        return Err(UpstreamError::invalid_field("rates.KRW", raw));
    }
    Ok(rate)
}

/// An FX provider reached over HTTP whose JSON carries `rates.KRW`.
pub struct HttpFxProvider {
    name: String,
    url: String,
    http: HttpFetcher,
}

impl HttpFxProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>, http: HttpFetcher) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl FxProvider for HttpFxProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn usd_krw(&self) -> Result<f64, UpstreamError> {
        let body = self.http.get_json(&self.url, &[]).await?;
        parse_krw_rate(&body)
    }
}

/// Ordered list of FX providers; the first success wins.
pub struct FxChain {
    providers: Vec<Arc<dyn FxProvider>>,
}

impl FxChain {
    pub fn new(providers: Vec<Arc<dyn FxProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try every provider in order. If all fail, the last error is returned.
    pub async fn fetch(&self) -> Result<FxQuote, UpstreamError> {
        let mut last_err = UpstreamError::MissingConfiguration("no FX providers configured".to_string());

        for provider in &self.providers {
            match provider.usd_krw().await {
                Ok(usd_krw) => {
                    debug!(provider = provider.name(), usd_krw, "FX rate fetched");
                    return Ok(FxQuote {
                        usd_krw,
                        provider: provider.name().to_string(),
                    });
                }
                Err(err) => {
                    warn!(provider = provider.name(), error = %err, "FX provider failed, trying next");
                    last_err = err;
                }
            }
        }

        Err(last_err)
    }
}

#[async_trait]
impl Refresh<FxQuote> for FxChain {
    async fn refresh(&self, _previous: Option<&FxQuote>) -> Result<FxQuote, UpstreamError> {
        self.fetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFx {
        name: &'static str,
        result: Result<f64, UpstreamError>,
        calls: AtomicUsize,
    }

    impl StubFx {
        fn new(name: &'static str, result: Result<f64, UpstreamError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    fn chain_of(providers: &[&Arc<StubFx>]) -> FxChain {
        FxChain::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn FxProvider>)
                .collect(),
        )
    }

    #[async_trait]
    impl FxProvider for StubFx {
        fn name(&self) -> &str {
            self.name
        }

        async fn usd_krw(&self) -> Result<f64, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn test_third_provider_wins() {
        let p1 = StubFx::new("one", Err(UpstreamError::UpstreamUnreachable("timeout".into())));
        let p2 = StubFx::new("two", Err(UpstreamError::http(500, "oops")));
        let p3 = StubFx::new("three", Ok(1312.5));
        let chain = chain_of(&[&p1, &p2, &p3]);
        assert_eq!(chain.len(), 3);

        let quote = chain.fetch().await.unwrap();
        assert_eq!(quote.usd_krw, 1312.5);
        assert_eq!(quote.provider, "three");
        assert_eq!(p1.calls.load(Ordering::SeqCst), 1);
        assert_eq!(p2.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let p1 = StubFx::new("one", Ok(1300.0));
        let p2 = StubFx::new("two", Ok(1400.0));
        let chain = chain_of(&[&p1, &p2]);

        assert_eq!(chain.fetch().await.unwrap().usd_krw, 1300.0);
        assert_eq!(p2.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_fail_returns_last_error() {
        let p1 = StubFx::new("one", Err(UpstreamError::UpstreamUnreachable("timeout".into())));
        let p2 = StubFx::new("two", Err(UpstreamError::http(502, "bad gateway")));
        let chain = chain_of(&[&p1, &p2]);
        assert_eq!(chain.fetch().await.unwrap_err(), UpstreamError::http(502, "bad gateway"));
    }

    #[tokio::test]
    async fn test_empty_chain_is_missing_configuration() {
        let chain = FxChain::new(Vec::new());
        assert!(chain.is_empty());
        assert_eq!(chain.fetch().await.unwrap_err().kind(), "missing_configuration");
    }

    #[test]
    fn test_parse_krw_rate_case_insensitive() {
        assert_eq!(parse_krw_rate(&json!({"rates": {"KRW": 1300.5}})).unwrap(), 1300.5);
        assert_eq!(parse_krw_rate(&json!({"rates": {"krw": "1299.9"}})).unwrap(), 1299.9);
        assert_eq!(
            parse_krw_rate(&json!({"base": "USD", "rates": {"EUR": 0.9}})).unwrap_err().kind(),
            "invalid_upstream_field"
        );
        assert_eq!(parse_krw_rate(&json!({"result": "error"})).unwrap_err().kind(), "malformed_payload");
        assert!(parse_krw_rate(&json!({"rates": {"KRW": 0}})).is_err());
    }
}
