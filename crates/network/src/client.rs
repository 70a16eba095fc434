// crates/network/src/client.rs
//! HTTP client wrapper

use crate::error::{NetworkError, NetworkResult};
use reqwest::{Client as ReqwestClient, Response};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connection establishment timeout. There is no whole-request
    /// deadline; large media transfers are bounded by the executor's
    /// stall guard instead.
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            user_agent: format!("TaleFetch/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// Thin reqwest wrapper shared by transfers and probes.
///
/// The client performs no retries of its own; the orchestrator's single
/// fallback hop is the only retry path in the system.
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Transport)?;

        Ok(Self { inner: client })
    }

    /// Performs a GET request. The response is returned whatever its
    /// status; callers inspect it.
    pub async fn get(&self, url: &str) -> NetworkResult<Response> {
        Ok(self.inner.get(url).send().await?)
    }

    /// Performs a HEAD request
    pub async fn head(&self, url: &str) -> NetworkResult<Response> {
        Ok(self.inner.head(url).send().await?)
    }

    /// Gets the content length of a URL without downloading.
    ///
    /// Reads the Content-Length header directly; a HEAD response has no
    /// body for the length to be inferred from.
    pub async fn content_length(&self, url: &str) -> NetworkResult<Option<u64>> {
        let response = self.head(url).await?;
        if !response.status().is_success() {
            return Err(NetworkError::HttpStatus(response.status().as_u16()));
        }
        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("TaleFetch/"));
    }

    #[test]
    fn test_client_creation() {
        assert!(Client::new().is_ok());
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = ClientConfig {
            connect_timeout: Duration::from_secs(10),
            user_agent: "TestAgent".to_string(),
            max_redirects: 5,
        };
        assert!(Client::with_config(config).is_ok());
    }

    #[test]
    fn test_client_clone() {
        let client = Client::new().expect("Failed to create client");
        let _cloned = client.clone();
    }
}
