use crate::alert::{run_alert_check, AlertCheckOutcome};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use kimchi_core::{CacheSource, RiskAssessment};
use serde::Serialize;
use std::sync::Arc;

pub fn relay_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Market data
        .route("/price", get(get_price))
        .route("/risk", get(get_risk))
        .route("/premium", get(get_premium))
        // Alerts
        .route("/alert-check", get(alert_check))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceResponse {
    symbol: String,
    currency: String,
    price: f64,
    source: String,
    cached: bool,
    stale: bool,
    fetched_at: DateTime<Utc>,
}

async fn get_price(State(state): State<Arc<AppState>>) -> Result<Json<PriceResponse>, ApiError> {
    let served = state.price.get().await?;
    let payload = served.value;
    Ok(Json(PriceResponse {
        symbol: payload.symbol,
        currency: payload.currency,
        price: payload.price,
        source: payload.source,
        cached: served.cached,
        stale: served.stale,
        fetched_at: payload.fetched_at,
    }))
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RiskResponse {
    symbol: String,
    funding_rate: f64,
    open_interest: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_open_interest: Option<f64>,
    risk: RiskAssessment,
    source: CacheSource,
    /// Epoch millis of the underlying fetch.
    ts: i64,
}

async fn get_risk(State(state): State<Arc<AppState>>) -> Result<Json<RiskResponse>, ApiError> {
    let served = state.risk.get().await?;
    let source = served.source();
    let snapshot = served.value;
    Ok(Json(RiskResponse {
        symbol: snapshot.symbol,
        funding_rate: snapshot.funding_rate,
        open_interest: snapshot.open_interest,
        prev_open_interest: snapshot.prev_open_interest,
        risk: snapshot.risk,
        source,
        ts: served.fetched_at.timestamp_millis(),
    }))
}

// ---------------------------------------------------------------------------
// Premium
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PremiumResponse {
    symbol: String,
    kimchi_premium: f64,
    coinbase_premium: f64,
    source: String,
    cached: bool,
    stale: bool,
    ts: i64,
    upbit_krw: f64,
    binance_usd: f64,
    coinbase_usd: f64,
    usd_krw: f64,
    fx_source: String,
    fx_stale: bool,
}

async fn get_premium(State(state): State<Arc<AppState>>) -> Result<Json<PremiumResponse>, ApiError> {
    let served = state.premium.get().await?;
    let premium = served.value;
    Ok(Json(PremiumResponse {
        symbol: premium.symbol,
        kimchi_premium: premium.kimchi_premium,
        coinbase_premium: premium.coinbase_premium,
        source: premium.source,
        cached: served.cached,
        stale: served.stale,
        ts: served.fetched_at.timestamp_millis(),
        upbit_krw: premium.upbit_krw,
        binance_usd: premium.binance_usd,
        coinbase_usd: premium.coinbase_usd,
        usd_krw: premium.usd_krw,
        fx_source: premium.fx_source,
        fx_stale: premium.fx_stale,
    }))
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

async fn alert_check(State(state): State<Arc<AppState>>) -> Json<AlertCheckOutcome> {
    Json(run_alert_check(&state).await)
}
