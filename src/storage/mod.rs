//! Persistent key-value store adapter.
//!
//! Every logical collection is kept as one JSON blob under a namespaced key
//! (`<prefix><collection>`, e.g. `ag_products`) and replaced wholesale on
//! each write. Backends only deal in raw strings; [`Repository`] layers typed
//! JSON access and the read-fallback policy on top.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

pub mod seed;

pub const DEFAULT_KEY_PREFIX: &str = "ag_";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Storage operation failed: {0}")]
    OperationFailed(String),
}

/// Logical collections held in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Products,
    Showrooms,
    Orders,
    Employees,
    Attendance,
    SalaryRecords,
    Transfers,
    Settings,
    Auth,
    /// Durable order-number counter.
    OrderSequence,
}

impl StorageKey {
    pub const ALL: [StorageKey; 10] = [
        StorageKey::Products,
        StorageKey::Showrooms,
        StorageKey::Orders,
        StorageKey::Employees,
        StorageKey::Attendance,
        StorageKey::SalaryRecords,
        StorageKey::Transfers,
        StorageKey::Settings,
        StorageKey::Auth,
        StorageKey::OrderSequence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Products => "products",
            StorageKey::Showrooms => "showrooms",
            StorageKey::Orders => "orders",
            StorageKey::Employees => "employees",
            StorageKey::Attendance => "attendance",
            StorageKey::SalaryRecords => "salary_records",
            StorageKey::Transfers => "transfers",
            StorageKey::Settings => "settings",
            StorageKey::Auth => "auth",
            StorageKey::OrderSequence => "order_sequence",
        }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Process-local backend, used for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<DashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.store.contains_key(key))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.store.clear();
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened file storage");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Readers never observe a half-written blob.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                tokio::fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}

/// Typed JSON access to a backend under a key prefix.
#[derive(Clone)]
pub struct Repository {
    backend: Arc<dyn StorageBackend>,
    prefix: String,
}

impl Repository {
    pub fn new(backend: Arc<dyn StorageBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn key(&self, key: StorageKey) -> String {
        format!("{}{}", self.prefix, key.as_str())
    }

    /// Reads a value, falling back to `default` when the key is absent,
    /// unreadable or holds corrupted JSON. Failures are logged, not returned.
    pub async fn load<T: DeserializeOwned>(&self, key: StorageKey, default: T) -> T {
        match self.load_optional(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                error!(key = %self.key(key), error = %e, "Error reading from storage; using default");
                default
            }
        }
    }

    pub async fn load_optional<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<T>, StorageError> {
        let full_key = self.key(key);
        match self.backend.get(&full_key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save<T: Serialize + ?Sized>(
        &self,
        key: StorageKey,
        value: &T,
    ) -> Result<(), StorageError> {
        let full_key = self.key(key);
        let raw = serde_json::to_string(value)?;
        self.backend.set(&full_key, &raw).await.map_err(|e| {
            warn!(key = %full_key, error = %e, "Error writing to storage");
            e
        })
    }

    pub async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        self.backend.remove(&self.key(key)).await
    }

    pub async fn contains(&self, key: StorageKey) -> Result<bool, StorageError> {
        self.backend.exists(&self.key(key)).await
    }

    /// Removes every known collection under this prefix.
    pub async fn clear(&self) -> Result<(), StorageError> {
        for key in StorageKey::ALL {
            self.remove(key).await?;
        }
        Ok(())
    }
}
