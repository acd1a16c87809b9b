pub mod binance;
pub mod coinbase;
pub mod fx;
pub mod http;
pub mod premium;
pub mod sources;
pub mod upbit;

use binance::BinanceClient;
use coinbase::CoinbaseClient;
use fx::{FxChain, HttpFxProvider};
use http::HttpFetcher;
use kimchi_core::config::UpstreamConfig;
use kimchi_core::{FxProvider, UpstreamError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use upbit::UpbitClient;

/// All upstream clients, built from configuration and sharing one HTTP
/// connection pool.
pub struct UpstreamClients {
    pub binance: Arc<BinanceClient>,
    pub upbit: Arc<UpbitClient>,
    pub coinbase: Arc<CoinbaseClient>,
    pub fx_chain: Arc<FxChain>,
}

impl UpstreamClients {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = HttpFetcher::new(Duration::from_millis(config.timeout_ms))?;

        let fx_providers: Vec<Arc<dyn FxProvider>> = config
            .fx_providers
            .iter()
            .map(|p| Arc::new(HttpFxProvider::new(&p.name, &p.url, http.clone())) as Arc<dyn FxProvider>)
            .collect();
        let fx_chain = FxChain::new(fx_providers);
        debug!(fx_providers = fx_chain.len(), timeout_ms = config.timeout_ms, "Upstream clients built");

        Ok(Self {
            binance: Arc::new(BinanceClient::new(
                http.clone(),
                &config.binance_spot_url,
                &config.binance_futures_url,
            )),
            upbit: Arc::new(UpbitClient::new(http.clone(), &config.upbit_url)),
            coinbase: Arc::new(CoinbaseClient::new(http, &config.coinbase_url)),
            fx_chain: Arc::new(fx_chain),
        })
    }
}
