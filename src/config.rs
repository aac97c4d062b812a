use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::constants;

/// Client configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the pallet API, always ending with `/`
    pub api_url: String,
    /// Transport-level deadline for a single request
    pub request_timeout: Duration,
    /// Where the bearer token is persisted between runs
    pub credentials_path: PathBuf,
    /// Delay between reachability checks while offline
    pub link_check_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
            credentials_path: PathBuf::from(constants::DEFAULT_CREDENTIALS_PATH),
            link_check_interval: Duration::from_secs(constants::DEFAULT_LINK_CHECK_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let api_url = env::var("PALLET_API_URL")
            .unwrap_or_else(|_| constants::DEFAULT_API_URL.to_string());

        let timeout_secs = env::var("PALLET_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(constants::DEFAULT_REQUEST_TIMEOUT_SECS);

        let credentials_path = env::var("PALLET_CREDENTIALS_PATH")
            .unwrap_or_else(|_| constants::DEFAULT_CREDENTIALS_PATH.to_string());

        let link_check_secs = env::var("PALLET_LINK_CHECK_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .unwrap_or(constants::DEFAULT_LINK_CHECK_SECS);

        let config = Self::new(api_url)
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_credentials_path(credentials_path)
            .with_link_check_interval(Duration::from_secs(link_check_secs));

        info!(
            api_url = %config.api_url,
            timeout_secs,
            "⚙️ Client configuration loaded"
        );
        config
    }

    pub fn new(api_url: impl Into<String>) -> Self {
        let mut api_url = api_url.into().trim().to_string();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        Self {
            api_url,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_link_check_interval(mut self, interval: Duration) -> Self {
        self.link_check_interval = interval;
        self
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let config = ClientConfig::new("http://127.0.0.1:8000");
        assert_eq!(config.api_url, "http://127.0.0.1:8000/");
        assert_eq!(
            config.endpoint("/sorties/destruction"),
            "http://127.0.0.1:8000/sorties/destruction"
        );
        assert_eq!(
            config.endpoint("entree/palette/P1"),
            "http://127.0.0.1:8000/entree/palette/P1"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, constants::DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.link_check_interval, Duration::from_secs(10));
    }
}
