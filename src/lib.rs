//! AgriERP core library
//!
//! Per-showroom stock ledger, order placement, stock transfers and the
//! surrounding catalog, staff and session records of an agriculture retail
//! chain, persisted as JSON blobs in a key-value store.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod models;
pub mod services;
pub mod storage;
pub mod store;

use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::storage::{FileStorage, InMemoryStorage, Repository, StorageBackend};
use crate::store::DataStore;

pub use crate::services::AppServices;

/// Builds the storage backend selected by the configuration.
pub async fn open_backend(config: &AppConfig) -> Result<Arc<dyn StorageBackend>, ServiceError> {
    if config.uses_file_storage() {
        let storage = FileStorage::open(&config.storage_dir).await?;
        info!(dir = %storage.dir().display(), "Using file storage");
        Ok(Arc::new(storage))
    } else {
        info!("Using in-memory storage");
        Ok(Arc::new(InMemoryStorage::new()))
    }
}

/// Opens the data store over `backend`, seeding missing collections first
/// when the configuration asks for it.
pub async fn open_store(
    config: &AppConfig,
    backend: Arc<dyn StorageBackend>,
) -> Result<DataStore, ServiceError> {
    let repo = Repository::new(backend, config.key_prefix.clone());
    if config.seed_on_start {
        storage::seed::seed_defaults(&repo).await?;
    }
    DataStore::open(repo).await
}
