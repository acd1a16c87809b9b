//! Refresh sources backing the relay's caches.

use crate::premium::compute_premium;
use async_trait::async_trait;
use kimchi_core::{
    Clock, DerivativesFeed, FreshCache, FxQuote, PremiumState, PricePayload, Refresh, RiskState,
    SpotFeed, UpstreamError,
};
use kimchi_risk::compute_risk;
use std::sync::Arc;
use tracing::debug;

// ---------------------------------------------------------------------------
// Spot Price
// ---------------------------------------------------------------------------

/// Spot price of one base asset on one venue.
pub struct SpotPriceSource {
    feed: Arc<dyn SpotFeed>,
    base_asset: String,
    clock: Arc<dyn Clock>,
}

impl SpotPriceSource {
    pub fn new(feed: Arc<dyn SpotFeed>, base_asset: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            feed,
            base_asset: base_asset.into(),
            clock,
        }
    }
}

#[async_trait]
impl Refresh<PricePayload> for SpotPriceSource {
    async fn refresh(&self, _previous: Option<&PricePayload>) -> Result<PricePayload, UpstreamError> {
        let price = self.feed.spot_price(&self.base_asset).await?;
        Ok(PricePayload {
            symbol: self.feed.symbol(&self.base_asset),
            currency: self.feed.currency().to_string(),
            price,
            source: self.feed.venue().to_string(),
            fetched_at: self.clock.now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

/// Funding rate + open interest, classified.
///
/// Open interest from the previous successful fetch is carried forward as
/// `prev_open_interest` so the classifier can see the delta.
pub struct RiskSource {
    feed: Arc<dyn DerivativesFeed>,
    symbol: String,
}

impl RiskSource {
    pub fn new(feed: Arc<dyn DerivativesFeed>, symbol: impl Into<String>) -> Self {
        Self {
            feed,
            symbol: symbol.into(),
        }
    }
}

#[async_trait]
impl Refresh<RiskState> for RiskSource {
    async fn refresh(&self, previous: Option<&RiskState>) -> Result<RiskState, UpstreamError> {
        let (funding_rate, open_interest) = tokio::try_join!(
            self.feed.funding_rate(&self.symbol),
            self.feed.open_interest(&self.symbol),
        )?;

        let prev_open_interest = previous.map(|p| p.open_interest);
        let risk = compute_risk(funding_rate, open_interest, prev_open_interest);
        debug!(
            symbol = %self.symbol,
            funding_rate,
            open_interest,
            level = %risk.level,
            "Risk refreshed"
        );

        Ok(RiskState {
            symbol: self.symbol.clone(),
            funding_rate,
            open_interest,
            risk,
            prev_open_interest,
        })
    }
}

// ---------------------------------------------------------------------------
// Premium
// ---------------------------------------------------------------------------

/// Kimchi and Coinbase premiums from three venues plus the FX cache.
pub struct PremiumSource {
    base_asset: String,
    krw_venue: Arc<dyn SpotFeed>,
    reference_venue: Arc<dyn SpotFeed>,
    usd_venue: Arc<dyn SpotFeed>,
    fx: Arc<FreshCache<FxQuote>>,
}

impl PremiumSource {
    /// `krw_venue` quotes in KRW (Upbit), `reference_venue` is the USD
    /// reference (Binance), `usd_venue` is the second USD venue (Coinbase).
    pub fn new(
        base_asset: impl Into<String>,
        krw_venue: Arc<dyn SpotFeed>,
        reference_venue: Arc<dyn SpotFeed>,
        usd_venue: Arc<dyn SpotFeed>,
        fx: Arc<FreshCache<FxQuote>>,
    ) -> Self {
        Self {
            base_asset: base_asset.into(),
            krw_venue,
            reference_venue,
            usd_venue,
            fx,
        }
    }
}

#[async_trait]
impl Refresh<PremiumState> for PremiumSource {
    async fn refresh(&self, _previous: Option<&PremiumState>) -> Result<PremiumState, UpstreamError> {
        let base = self.base_asset.as_str();
        let (upbit_krw, binance_usd, coinbase_usd, fx) = tokio::try_join!(
            self.krw_venue.spot_price(base),
            self.reference_venue.spot_price(base),
            self.usd_venue.spot_price(base),
            self.fx.get(),
        )?;

        let premiums = compute_premium(upbit_krw, binance_usd, coinbase_usd, fx.value.usd_krw)?;

        Ok(PremiumState {
            symbol: base.to_uppercase(),
            kimchi_premium: premiums.kimchi,
            coinbase_premium: premiums.coinbase,
            source: format!(
                "{}/{}/{}",
                self.krw_venue.venue(),
                self.reference_venue.venue(),
                self.usd_venue.venue()
            ),
            upbit_krw,
            binance_usd,
            coinbase_usd,
            usd_krw: fx.value.usd_krw,
            fx_source: fx.value.provider,
            fx_stale: fx.stale,
        })
    }
}
