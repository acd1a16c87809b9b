use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kimchi_core::UpstreamError;
use tracing::error;

/// Status returned whenever upstream failed and no cached value exists.
pub const UPSTREAM_UNAVAILABLE: StatusCode = StatusCode::BAD_GATEWAY;

/// Errors surfaced by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upstream(err) => {
                error!(kind = err.kind(), error = %err, "Upstream unavailable and nothing cached");
                (
                    UPSTREAM_UNAVAILABLE,
                    Json(serde_json::json!({
                        "error": "upstream_unavailable",
                        "detail": err.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}
