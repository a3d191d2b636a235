use std::env;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Client configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub cache_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            cache_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl ClientConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = env::var("FOLIO_API_URL").unwrap_or(defaults.api_url);

        let timeout = env::var("FOLIO_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_retries = env::var("FOLIO_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_retries);

        let base_delay = env::var("FOLIO_BASE_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_delay);

        let cache_ttl = env::var("FOLIO_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let sweep_interval = env::var("FOLIO_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);

        Self {
            api_url,
            timeout,
            max_retries,
            base_delay,
            cache_ttl,
            sweep_interval,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Retry settings for idempotent calls
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            ..RetryConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));

        let retry = config.retry_config();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.delay_for(1), Duration::from_millis(1000));
    }

    #[test]
    fn test_with_api_url() {
        let config = ClientConfig::default().with_api_url("https://api.example.com");
        assert_eq!(config.api_url, "https://api.example.com");
    }
}
