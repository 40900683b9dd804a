use std::str::FromStr;
use std::time::Duration;

use smart_default::SmartDefault;

use crate::wiki::{error::ConfigError, retry::RetryPolicy};

/// Upper bound the API accepts for `cmlimit`.
pub const MAX_PAGE_LIMIT: u32 = 500;

#[derive(Debug, Clone, SmartDefault)]
pub struct WikiConfig {
    #[default = "https://en.wikipedia.org/w/api.php"]
    pub api_url: String,

    #[default(concat!("wiki-wordfreq/", env!("CARGO_PKG_VERSION")).to_string())]
    pub user_agent: String,

    #[default(Duration::from_secs(30))]
    pub timeout: Duration,

    /// Pause between consecutive requests.
    #[default(Duration::from_millis(500))]
    pub request_delay: Duration,

    #[default(MAX_PAGE_LIMIT)]
    pub page_limit: u32,

    pub retry: RetryPolicy,
}

impl WikiConfig {
    /// Reads overrides from the environment (and `.env`), falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("WIKI_API_URL") {
            config.api_url = url;
        }
        if let Ok(agent) = std::env::var("WIKI_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(ms) = parse_var::<u64>("WIKI_REQUEST_DELAY_MS")? {
            config.request_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>("WIKI_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_var::<u32>("WIKI_MAX_ATTEMPTS")? {
            config.retry.max_attempts = attempts.max(1);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `page_limit` clamped to what the API accepts.
    pub fn effective_page_limit(&self) -> u32 {
        self.page_limit.clamp(1, MAX_PAGE_LIMIT)
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WikiConfig::default();
        assert_eq!(config.api_url, "https://en.wikipedia.org/w/api.php");
        assert!(config.user_agent.starts_with("wiki-wordfreq/"));
        assert_eq!(config.effective_page_limit(), 500);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_page_limit_is_clamped() {
        let config = WikiConfig {
            page_limit: 5000,
            ..WikiConfig::default()
        };
        assert_eq!(config.effective_page_limit(), MAX_PAGE_LIMIT);
    }
}
