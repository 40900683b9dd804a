use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to list pages of '{category}' after {attempts} attempt(s)")]
    PageList {
        category: String,
        attempts: u32,
        #[source]
        source: RequestError,
    },

    #[error("Failed to fetch content of '{title}' after {attempts} attempt(s)")]
    Content {
        title: String,
        attempts: u32,
        #[source]
        source: RequestError,
    },

    #[error("Failed to fetch page '{url}' after {attempts} attempt(s)")]
    Page {
        url: String,
        attempts: u32,
        #[source]
        source: RequestError,
    },

    #[error("Error constructing HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Failure of a single request against the remote API.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Transport error")]
    Transport(#[from] reqwest::Error),

    #[error("Rate limited by remote API")]
    RateLimited,

    #[error("Remote API returned HTTP {0}")]
    Status(u16),

    #[error("Remote API error '{code}': {info}")]
    Api { code: String, info: String },

    #[error("Malformed API response: {0}")]
    Malformed(String),
}

impl RequestError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RequestError::Transport(e) => !e.is_builder(),
            RequestError::RateLimited => true,
            RequestError::Status(code) => *code >= 500,
            RequestError::Api { code, .. } => matches!(code.as_str(), "ratelimited" | "maxlag"),
            RequestError::Malformed(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {name}")]
    Invalid { name: &'static str, value: String },
}
