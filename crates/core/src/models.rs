use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Spot Price
// ---------------------------------------------------------------------------

/// A spot price observation from a single venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePayload {
    /// Venue-specific symbol (e.g. "BTCUSDT").
    pub symbol: String,
    /// Quote currency of `price`.
    pub currency: String,
    pub price: f64,
    /// Venue the price came from.
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

/// Coarse risk level derived from derivatives data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Ok,
    Warn,
    Danger,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Ok => "OK",
            RiskLevel::Warn => "WARN",
            RiskLevel::Danger => "DANGER",
        }
    }

    /// Whether this level is worth alerting on.
    pub fn is_alertable(&self) -> bool {
        !matches!(self, RiskLevel::Ok)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the risk classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Human-readable reasons, in a fixed order.
    pub reasons: Vec<String>,
}

/// Funding + open interest snapshot with its risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskState {
    pub symbol: String,
    pub funding_rate: f64,
    pub open_interest: f64,
    pub risk: RiskAssessment,
    /// Open interest from the previous successful fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_open_interest: Option<f64>,
}

// ---------------------------------------------------------------------------
// Premium
// ---------------------------------------------------------------------------

/// USD→KRW exchange rate and the provider that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxQuote {
    pub usd_krw: f64,
    pub provider: String,
}

/// Cross-exchange premium derived from three spot prices and one FX rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumState {
    pub symbol: String,
    /// Upbit KRW price vs Binance USD price converted to KRW.
    pub kimchi_premium: f64,
    /// Coinbase USD price vs Binance USD price.
    pub coinbase_premium: f64,
    pub source: String,
    pub upbit_krw: f64,
    pub binance_usd: f64,
    pub coinbase_usd: f64,
    pub usd_krw: f64,
    pub fx_source: String,
    /// The FX rate was a stale fallback from the FX cache.
    pub fx_stale: bool,
}
