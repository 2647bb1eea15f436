//! Single-request HTTP transport.
//!
//! The [`Transport`] trait is the seam between the sync engine and the
//! network. [`HttpTransport`] is the production implementation; anything that
//! can answer a GET with a body (or fail) can stand in for it.

use crate::api::client::FetchError;
use std::future::Future;

/// Issues one GET against the activity service and returns the raw body.
///
/// Implementations own timeout enforcement. A non-success HTTP status must be
/// reported as [`FetchError::Transport`].
pub trait Transport: Send + Sync + 'static {
    fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// reqwest-backed transport with a fixed base URL and request timeout.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport for `base_url` (scheme and host, no trailing path).
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("activity-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build a transport from the loaded configuration.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, FetchError> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        let url = self.url(path);
        let request = self.client.get(&url).query(query);

        async move {
            tracing::debug!(%url, "GET");
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(FetchError::Transport(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    body.trim()
                )));
            }

            response
                .text()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))
        }
    }
}

#[cfg(all(test, feature = "http"))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_http_transport_url() {
        let transport = HttpTransport::new("http://127.0.0.1:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://127.0.0.1:8080");
        assert_eq!(transport.url("/api/stats"), "http://127.0.0.1:8080/api/stats");
    }
}
