//! Cooldown-gated risk alerting.
//!
//! Alerts are delivered as `warn!` events on the `kimchi::alert` target.

use crate::state::AppState;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Result of one alert check. Always produced, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCheckOutcome {
    pub ok: bool,
    pub alerted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_alert_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetch the current risk and fire an alert unless the cooldown suppresses it.
pub async fn run_alert_check(state: &AppState) -> AlertCheckOutcome {
    let served = match state.risk.get().await {
        Ok(served) => served,
        Err(err) => {
            error!(error = %err, "Alert check could not fetch risk");
            return AlertCheckOutcome {
                ok: false,
                alerted: false,
                last_alert_ts: None,
                error: Some(err.to_string()),
            };
        }
    };

    let snapshot = &served.value;
    let now = state.clock.now();
    let mut cooldown = state.cooldown.lock().await;
    let alerted = cooldown.should_alert(snapshot.risk.level, &snapshot.risk.reasons, now);

    if alerted {
        warn!(
            target: "kimchi::alert",
            symbol = %snapshot.symbol,
            level = %snapshot.risk.level,
            reasons = ?snapshot.risk.reasons,
            funding_rate = snapshot.funding_rate,
            open_interest = snapshot.open_interest,
            stale = served.stale,
            "Risk alert"
        );
    }

    AlertCheckOutcome {
        ok: true,
        alerted,
        last_alert_ts: cooldown.last_alert_at().map(|t| t.timestamp_millis()),
        error: None,
    }
}

/// Run the alert check on a fixed interval inside the process.
pub fn spawn_alert_scheduler(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "Starting in-process alert scheduler");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let outcome = run_alert_check(&state).await;
            debug!(ok = outcome.ok, alerted = outcome.alerted, "Scheduled alert check");
        }
    })
}
