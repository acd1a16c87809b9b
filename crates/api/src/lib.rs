pub mod alert;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum application router.
///
/// Every route is served both at the root and under `/api`.
pub fn build_router(state: Arc<state::AppState>) -> Router {
    Router::new()
        .merge(routes::relay_routes())
        .nest("/api", routes::relay_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server, optionally running the alert check on a timer.
pub async fn start_server(
    state: Arc<state::AppState>,
    bind_addr: &str,
    alert_interval: Option<Duration>,
) -> anyhow::Result<()> {
    let scheduler = alert_interval.map(|every| alert::spawn_alert_scheduler(state.clone(), every));

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("API server listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
