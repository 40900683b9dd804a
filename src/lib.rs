pub mod analyze;
pub mod cache;
pub mod error;
pub mod http;
pub mod text;
pub mod wiki;

pub use analyze::{Analysis, AnalyzeError, Analyzer, Source};
pub use cache::{derive_key, CacheKey, CacheStore};
pub use error::RestError;
