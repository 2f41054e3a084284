//! Bridge configuration

use std::time::Duration;

use url::Url;

/// Configuration for the bridge process
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL of the wrapped ticket API
    pub api_base_url: Url,

    /// Bearer credential for the Authorization header
    pub api_token: String,

    /// Per-call ceiling for downstream requests
    pub request_timeout: Duration,

    /// Maximum simultaneous downstream calls
    pub concurrency_limit: usize,
}

/// Builder for `BridgeConfig` with validation
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    api_base_url: Option<String>,
    api_token: Option<String>,
    request_timeout_seconds: Option<u64>,
    concurrency_limit: Option<usize>,
}

/// Error type for configuration building
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// API base URL was not provided
    #[error("API base URL is required")]
    MissingBaseUrl,
    /// API token was not provided
    #[error("API token is required")]
    MissingToken,
    /// API base URL could not be parsed
    #[error("invalid API base URL '{0}': {1}")]
    InvalidBaseUrl(String, url::ParseError),
    /// Timeout value is outside the valid range
    #[error("request timeout must be between 1 and 300 seconds, got {0}")]
    InvalidTimeout(u64),
    /// Concurrency limit is outside the valid range
    #[error("concurrency limit must be between 1 and 64, got {0}")]
    InvalidConcurrency(usize),
}

impl BridgeConfig {
    /// Create a new builder instance
    #[inline]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }
}

impl BridgeConfigBuilder {
    /// Set the API base URL
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the bearer credential
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the per-call timeout in seconds
    pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = Some(seconds);
        self
    }

    /// Set the maximum simultaneous downstream calls
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<BridgeConfig, ConfigError> {
        let raw_url = self.api_base_url.ok_or(ConfigError::MissingBaseUrl)?;
        let api_base_url =
            Url::parse(&raw_url).map_err(|e| ConfigError::InvalidBaseUrl(raw_url, e))?;
        let api_token = self.api_token.ok_or(ConfigError::MissingToken)?;

        let timeout_seconds = self.request_timeout_seconds.unwrap_or(30);
        if !(1..=300).contains(&timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(timeout_seconds));
        }

        let concurrency_limit = self.concurrency_limit.unwrap_or(8);
        if !(1..=64).contains(&concurrency_limit) {
            return Err(ConfigError::InvalidConcurrency(concurrency_limit));
        }

        Ok(BridgeConfig {
            api_base_url,
            api_token,
            request_timeout: Duration::from_secs(timeout_seconds),
            concurrency_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = BridgeConfig::builder()
            .api_base_url("https://tickets.example.com/api")
            .api_token("secret")
            .build()
            .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency_limit, 8);
        assert_eq!(config.api_base_url.host_str(), Some("tickets.example.com"));
    }

    #[test]
    fn test_missing_base_url() {
        let err = BridgeConfig::builder().api_token("t").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseUrl));
    }

    #[test]
    fn test_missing_token() {
        let err = BridgeConfig::builder()
            .api_base_url("https://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = BridgeConfig::builder()
            .api_base_url("not a url")
            .api_token("t")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(..)));
    }

    #[test]
    fn test_timeout_range() {
        let err = BridgeConfig::builder()
            .api_base_url("https://example.com")
            .api_token("t")
            .request_timeout_seconds(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(0)));

        let err = BridgeConfig::builder()
            .api_base_url("https://example.com")
            .api_token("t")
            .request_timeout_seconds(301)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(301)));
    }

    #[test]
    fn test_concurrency_range() {
        let err = BridgeConfig::builder()
            .api_base_url("https://example.com")
            .api_token("t")
            .concurrency_limit(65)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConcurrency(65)));
    }
}
