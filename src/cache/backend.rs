use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{key::CacheKey, record::Namespace};

/// Raw byte storage addressed by `(namespace, key)`.
///
/// Implementations must make `write` atomic with respect to `read`: a reader
/// sees either the previous bytes or the new ones, never a mix.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn read(&self, namespace: Namespace, key: &CacheKey) -> io::Result<Option<Vec<u8>>>;

    async fn write(&self, namespace: Namespace, key: &CacheKey, bytes: &[u8]) -> io::Result<()>;

    async fn remove(&self, namespace: Namespace, key: &CacheKey) -> io::Result<()>;
}

/// One JSON file per record under `<root>/<namespace>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub async fn init(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        for namespace in Namespace::ALL {
            tokio::fs::create_dir_all(root.join(namespace.as_str())).await?;
        }

        debug!("cache initialised at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, namespace: Namespace, key: &CacheKey) -> PathBuf {
        self.root
            .join(namespace.as_str())
            .join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl CacheBackend for FileBackend {
    async fn read(&self, namespace: Namespace, key: &CacheKey) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.record_path(namespace, key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, namespace: Namespace, key: &CacheKey, bytes: &[u8]) -> io::Result<()> {
        let path = self.record_path(namespace, key);
        // unique per writer so racing puts never share a temp file
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4()));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }

        Ok(())
    }

    async fn remove(&self, namespace: Namespace, key: &CacheKey) -> io::Result<()> {
        match tokio::fs::remove_file(self.record_path(namespace, key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Process-local backend, used for ephemeral runs and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<(Namespace, CacheKey), Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn read(&self, namespace: Namespace, key: &CacheKey) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(&(namespace, key.clone())).cloned())
    }

    async fn write(&self, namespace: Namespace, key: &CacheKey, bytes: &[u8]) -> io::Result<()> {
        self.entries
            .write()
            .await
            .insert((namespace, key.clone()), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, namespace: Namespace, key: &CacheKey) -> io::Result<()> {
        self.entries.write().await.remove(&(namespace, key.clone()));
        Ok(())
    }
}
