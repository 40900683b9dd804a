pub mod backend;
pub mod error;
pub mod key;
pub mod record;
pub mod store;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use error::CacheError;
pub use key::{derive_key, derive_text_key, derive_url_key, normalize_identity, CacheKey};
pub use record::{CacheRecord, Namespace};
pub use store::CacheStore;
