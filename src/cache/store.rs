use std::path::PathBuf;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{
    backend::{CacheBackend, FileBackend, MemoryBackend},
    error::CacheError,
    key::CacheKey,
    record::{CacheRecord, Namespace},
};

/// Typed access to the three cache namespaces.
///
/// Reads never fail: a missing, unreadable or undecodable record is reported
/// as absent so the caller recomputes it.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Opens (creating if needed) an on-disk store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let backend = FileBackend::init(root).await?;
        Ok(Self::new(Arc::new(backend)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        namespace: Namespace,
    ) -> Option<CacheRecord<T>> {
        let bytes = match self.backend.read(namespace, key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("cache miss: {namespace}/{key}");
                return None;
            }
            Err(e) => {
                warn!("failed reading {namespace}/{key}, treating as absent: {e}");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => {
                debug!("cache hit: {namespace}/{key}");
                Some(record)
            }
            Err(source) => {
                let err = CacheError::Corrupt {
                    namespace,
                    key: key.clone(),
                    source,
                };
                warn!("{err}, recomputing: {:?}", std::error::Error::source(&err));
                None
            }
        }
    }

    pub async fn put<T: Serialize>(
        &self,
        key: &CacheKey,
        namespace: Namespace,
        payload: &T,
    ) -> Result<(), CacheError> {
        let record = CacheRecord::new(payload);
        let bytes = serde_json::to_vec(&record).map_err(|source| CacheError::Encode {
            namespace,
            key: key.clone(),
            source,
        })?;

        self.backend.write(namespace, key, &bytes).await?;
        debug!("cache write: {namespace}/{key} ({} bytes)", bytes.len());
        Ok(())
    }

    pub async fn invalidate(&self, key: &CacheKey, namespace: Namespace) -> Result<(), CacheError> {
        self.backend.remove(namespace, key).await?;
        debug!("cache invalidated: {namespace}/{key}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::derive_key;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = CacheStore::in_memory();
        let key = derive_key("Physics");
        let titles = vec!["Atom".to_string(), "Photon".to_string()];

        store.put(&key, Namespace::Pages, &titles).await.unwrap();
        let record: CacheRecord<Vec<String>> = store.get(&key, Namespace::Pages).await.unwrap();

        assert_eq!(record.payload, titles);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = CacheStore::in_memory();
        let key = derive_key("Physics");

        store.put(&key, Namespace::Pages, &vec!["Old"]).await.unwrap();
        store.put(&key, Namespace::Pages, &vec!["New"]).await.unwrap();

        let record: CacheRecord<Vec<String>> = store.get(&key, Namespace::Pages).await.unwrap();
        assert_eq!(record.payload, vec!["New".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_as_absent() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CacheStore::new(backend.clone());
        let key = derive_key("Physics");

        backend
            .write(Namespace::Frequency, &key, b"\x00not json{")
            .await
            .unwrap();

        let record: Option<CacheRecord<Vec<String>>> = store.get(&key, Namespace::Frequency).await;
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_reads_as_absent() {
        let store = CacheStore::in_memory();
        let key = derive_key("Physics");

        store.put(&key, Namespace::Pages, &42u32).await.unwrap();

        let record: Option<CacheRecord<Vec<String>>> = store.get(&key, Namespace::Pages).await;
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_removes_only_that_namespace() {
        let store = CacheStore::in_memory();
        let key = derive_key("Physics");

        store.put(&key, Namespace::Pages, &vec!["Atom"]).await.unwrap();
        store.put(&key, Namespace::Frequency, &vec!["atom"]).await.unwrap();
        store.invalidate(&key, Namespace::Frequency).await.unwrap();

        assert!(store
            .get::<Vec<String>>(&key, Namespace::Frequency)
            .await
            .is_none());
        assert!(store.get::<Vec<String>>(&key, Namespace::Pages).await.is_some());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = derive_key("Physics");

        {
            let store = CacheStore::open(dir.path()).await.unwrap();
            store.put(&key, Namespace::Content, &vec!["text"]).await.unwrap();
        }

        let reopened = CacheStore::open(dir.path()).await.unwrap();
        let record: CacheRecord<Vec<String>> =
            reopened.get(&key, Namespace::Content).await.unwrap();
        assert_eq!(record.payload, vec!["text".to_string()]);
    }

    #[tokio::test]
    async fn test_truncated_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).await.unwrap();
        let key = derive_key("Physics");

        let path = dir.path().join("frequency").join(format!("{key}.json"));
        std::fs::write(&path, br#"{"created_at":"2024-01-01T00:00:00Z","payl"#).unwrap();

        assert!(store
            .get::<Vec<String>>(&key, Namespace::Frequency)
            .await
            .is_none());
    }
}
