use reqwest::header::HeaderValue;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;

/// Origin presented to collectors that allow-list by origin; the host has no natural one.
pub const DEFAULT_ORIGIN: &str = "react-native://";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub origin: String,
    pub user_agent: String,
    pub connection_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: format!("rask-monitor-agent/{}", env!("CARGO_PKG_VERSION")),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// Shared HTTP plumbing for deliveries.
///
/// No overall request timeout is set: a delivery that never completes
/// simply never invokes its callbacks.
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub client: Client,
    pub config: ClientConfig,
    pub origin: HeaderValue,
    pub runtime: Handle,
}

impl HttpClient {
    /// Must be called from within a tokio runtime; deliveries are spawned onto it.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let origin = HeaderValue::from_str(&config.origin).map_err(|e| {
            ClientError::InvalidConfiguration(format!("Invalid origin '{}': {}", config.origin, e))
        })?;

        let runtime = Handle::try_current().map_err(|e| ClientError::NoRuntime(e.to_string()))?;

        let client = ClientBuilder::new()
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ClientError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            origin,
            runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_client_builds() {
        let client = HttpClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.origin, DEFAULT_ORIGIN);
    }

    #[tokio::test]
    async fn test_invalid_origin_is_rejected() {
        let config = ClientConfig {
            origin: "bad\norigin".to_string(),
            ..Default::default()
        };

        match HttpClient::new(config) {
            Err(ClientError::InvalidConfiguration(message)) => {
                assert!(message.contains("Invalid origin"));
            }
            other => panic!("Expected InvalidConfiguration, got: {:?}", other),
        }
    }

    #[test]
    fn test_client_requires_runtime() {
        let result = HttpClient::new(ClientConfig::default());
        assert!(matches!(result, Err(ClientError::NoRuntime(_))));
    }
}
