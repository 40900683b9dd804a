pub mod client;
pub mod config;
pub mod error;
pub mod live;
pub mod mock;
pub mod retry;
pub mod types;

pub use client::WikiClient;
pub use config::WikiConfig;
pub use error::{ConfigError, FetchError, RequestError};
pub use live::LiveWikiClient;
pub use mock::MockWikiClient;
pub use retry::RetryPolicy;
