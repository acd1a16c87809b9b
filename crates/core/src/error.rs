/// Maximum number of characters of an upstream error body kept in an error.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Errors that can occur while talking to a third-party market-data API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpstreamError {
    #[error("Invalid upstream field `{label}`: {raw}")]
    InvalidUpstreamField { label: String, raw: String },
    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamHttpError { status: u16, body: String },
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),
    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl UpstreamError {
    pub fn invalid_field(label: impl Into<String>, raw: impl ToString) -> Self {
        Self::InvalidUpstreamField {
            label: label.into(),
            raw: raw.to_string(),
        }
    }

    /// Build an HTTP error, truncating the body so a misbehaving upstream
    /// cannot flood the logs.
    pub fn http(status: u16, body: impl AsRef<str>) -> Self {
        let body: String = body.as_ref().chars().take(MAX_ERROR_BODY_CHARS).collect();
        Self::UpstreamHttpError { status, body }
    }

    /// Short machine-readable kind, used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUpstreamField { .. } => "invalid_upstream_field",
            Self::UpstreamHttpError { .. } => "upstream_http_error",
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::MissingConfiguration(_) => "missing_configuration",
            Self::InvalidConfiguration(_) => "invalid_configuration",
        }
    }
}
