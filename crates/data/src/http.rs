//! Outbound HTTP with a uniform timeout.
//!
//! Every upstream request goes through [`with_timeout`]. When the deadline
//! passes the request future is dropped, which releases the connection and
//! the timer on every exit path.

use kimchi_core::UpstreamError;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Run `fut` with a deadline, mapping expiry to [`UpstreamError::UpstreamUnreachable`].
pub async fn with_timeout<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(target_url = %what, timeout_ms = limit.as_millis() as u64, "Upstream request timed out");
            Err(UpstreamError::UpstreamUnreachable(format!(
                "{what}: timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

/// Thin JSON-over-HTTP client shared by every venue.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kimchi-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::UpstreamUnreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` with `query` and decode the body as JSON.
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, UpstreamError> {
        with_timeout(self.timeout, url, async {
            let resp = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| UpstreamError::UpstreamUnreachable(format!("{url}: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(UpstreamError::http(status.as_u16(), body));
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| UpstreamError::UpstreamUnreachable(format!("{url}: {e}")))?;
            debug!(url = %url, bytes = bytes.len(), "Upstream response received");

            serde_json::from_slice(&bytes)
                .map_err(|e| UpstreamError::MalformedPayload(format!("{url}: {e}")))
        })
        .await
    }
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept a single connection and answer it with a canned HTTP response.
    /// `None` accepts the connection and never answers.
    pub async fn serve_once(response: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            match response {
                Some(resp) => {
                    let _ = socket.write_all(resp.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(std::time::Duration::from_secs(30)).await,
            }
        });
        format!("http://{addr}")
    }

    /// A fetcher that bypasses any proxy configured in the environment.
    pub fn local_fetcher(timeout: std::time::Duration) -> super::HttpFetcher {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        super::HttpFetcher::with_client(client, timeout)
    }

    pub fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }
}
