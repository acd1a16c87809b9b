use kimchi_core::config::RelayConfig;
use kimchi_core::{
    Clock, FreshCache, FxQuote, PremiumState, PricePayload, RiskState, UpstreamError,
};
use kimchi_data::binance::usdt_symbol;
use kimchi_data::sources::{PremiumSource, RiskSource, SpotPriceSource};
use kimchi_data::UpstreamClients;
use kimchi_risk::AlertCooldown;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared application state accessible by all route handlers.
///
/// Each endpoint owns exactly one cache; caches are never shared between
/// endpoints.
pub struct AppState {
    pub price: FreshCache<PricePayload>,
    pub risk: FreshCache<RiskState>,
    pub premium: FreshCache<PremiumState>,
    /// Alert cooldown records (key → last fired).
    pub cooldown: Mutex<AlertCooldown>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        price: FreshCache<PricePayload>,
        risk: FreshCache<RiskState>,
        premium: FreshCache<PremiumState>,
        cooldown: AlertCooldown,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            price,
            risk,
            premium,
            cooldown: Mutex::new(cooldown),
            clock,
        }
    }

    /// Wire the live upstream clients into one cache per endpoint.
    pub fn from_config(config: &RelayConfig, clock: Arc<dyn Clock>) -> Result<Self, UpstreamError> {
        config.validate()?;
        let clients = UpstreamClients::from_config(&config.upstream)?;

        let ttl = config.cache.ttl()?;
        let max_stale = config.cache.max_stale()?;
        let base = config.market.base_asset.as_str();

        let fx: Arc<FreshCache<FxQuote>> = Arc::new(
            FreshCache::new("fx", clients.fx_chain.clone(), clock.clone(), ttl).with_max_stale(max_stale),
        );

        let price: FreshCache<PricePayload> = FreshCache::new(
            "price",
            Arc::new(SpotPriceSource::new(clients.binance.clone(), base, clock.clone())),
            clock.clone(),
            ttl,
        )
        .with_max_stale(max_stale);

        let risk: FreshCache<RiskState> = FreshCache::new(
            "risk",
            Arc::new(RiskSource::new(clients.binance.clone(), usdt_symbol(base))),
            clock.clone(),
            ttl,
        )
        .with_max_stale(max_stale);

        let premium: FreshCache<PremiumState> = FreshCache::new(
            "premium",
            Arc::new(PremiumSource::new(
                base,
                clients.upbit.clone(),
                clients.binance.clone(),
                clients.coinbase.clone(),
                fx.clone(),
            )),
            clock.clone(),
            ttl,
        )
        .with_max_stale(max_stale);

        for name in [fx.name(), price.name(), risk.name(), premium.name()] {
            debug!(cache = name, ttl_ms = ttl.num_milliseconds(), "Cache configured");
        }

        let cooldown = AlertCooldown::new(config.alert.cooldown()?);

        Ok(Self::new(price, risk, premium, cooldown, clock))
    }
}
