//! Single-writer state container.
//!
//! [`DataStore`] keeps the whole entity [`Snapshot`] in memory behind a tokio
//! `RwLock`. Readers get consistent copies; writers go through
//! [`DataStore::mutate`], which holds the write lock while the change is
//! applied to a clone and the touched collections are persisted. The clone
//! only replaces the live snapshot once every write succeeded, so callers
//! never observe state that the backend did not accept.

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::metrics;
use crate::models::{AuthState, Settings, Snapshot};
use crate::storage::{Repository, StorageError, StorageKey};

pub struct DataStore {
    repo: Repository,
    state: RwLock<Snapshot>,
    event_sender: Option<EventSender>,
}

impl DataStore {
    /// Loads every collection from the repository. Unreadable collections fall
    /// back to their defaults.
    pub async fn open(repo: Repository) -> Result<Self, ServiceError> {
        let snapshot = load_snapshot(&repo).await;
        info!(
            products = snapshot.products.len(),
            showrooms = snapshot.showrooms.len(),
            orders = snapshot.orders.len(),
            transfers = snapshot.transfers.len(),
            "Data store opened"
        );
        Ok(Self {
            repo,
            state: RwLock::new(snapshot),
            event_sender: None,
        })
    }

    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Consistent copy of the current state.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    /// Runs `f` against the current state under the read lock.
    pub async fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Applies `f` to a copy of the state and commits it.
    ///
    /// `touched` lists the collections `f` may change; only those are
    /// written. When `f` fails nothing is written. When a write fails the
    /// keys already written are restored and the live state is left as it
    /// was.
    pub async fn mutate<T, F>(&self, touched: &[StorageKey], f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Snapshot) -> Result<T, ServiceError>,
    {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        let output = f(&mut next)?;

        if next == *guard {
            debug!("Mutation left state unchanged; skipping persistence");
            return Ok(output);
        }

        self.persist(&guard, &next, touched).await?;
        *guard = next;
        Ok(output)
    }

    /// Delivers an event to the configured channel. Delivery problems are
    /// logged and otherwise ignored.
    pub async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to deliver domain event");
            }
        }
    }

    async fn persist(
        &self,
        current: &Snapshot,
        next: &Snapshot,
        touched: &[StorageKey],
    ) -> Result<(), StorageError> {
        let mut written = Vec::with_capacity(touched.len());

        for &key in touched {
            match write_key(&self.repo, next, key).await {
                Ok(()) => {
                    metrics::record_persistence_write(true);
                    written.push(key);
                }
                Err(e) => {
                    metrics::record_persistence_write(false);
                    error!(key = key.as_str(), error = %e, "Persisting mutation failed; rolling back");
                    for &done in &written {
                        if let Err(restore_err) = write_key(&self.repo, current, done).await {
                            error!(
                                key = done.as_str(),
                                error = %restore_err,
                                "Failed to restore collection after aborted mutation"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

async fn write_key(repo: &Repository, snapshot: &Snapshot, key: StorageKey) -> Result<(), StorageError> {
    match key {
        StorageKey::Products => repo.save(key, &snapshot.products).await,
        StorageKey::Showrooms => repo.save(key, &snapshot.showrooms).await,
        StorageKey::Orders => repo.save(key, &snapshot.orders).await,
        StorageKey::Employees => repo.save(key, &snapshot.employees).await,
        StorageKey::Attendance => repo.save(key, &snapshot.attendance).await,
        StorageKey::SalaryRecords => repo.save(key, &snapshot.salary_records).await,
        StorageKey::Transfers => repo.save(key, &snapshot.transfers).await,
        StorageKey::Settings => repo.save(key, &snapshot.settings).await,
        StorageKey::Auth => repo.save(key, &snapshot.auth).await,
        StorageKey::OrderSequence => repo.save(key, &snapshot.order_sequence).await,
    }
}

async fn load_snapshot(repo: &Repository) -> Snapshot {
    let orders: Vec<crate::models::Order> = repo.load(StorageKey::Orders, Vec::new()).await;

    // A store written before the counter existed starts from the order count.
    let stored_sequence = match repo.load_optional::<u64>(StorageKey::OrderSequence).await {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "Error reading order sequence; deriving from order count");
            None
        }
    };
    let order_sequence = stored_sequence.unwrap_or(0).max(orders.len() as u64);

    Snapshot {
        products: repo.load(StorageKey::Products, Vec::new()).await,
        showrooms: repo.load(StorageKey::Showrooms, Vec::new()).await,
        orders,
        employees: repo.load(StorageKey::Employees, Vec::new()).await,
        attendance: repo.load(StorageKey::Attendance, Vec::new()).await,
        salary_records: repo.load(StorageKey::SalaryRecords, Vec::new()).await,
        transfers: repo.load(StorageKey::Transfers, Vec::new()).await,
        settings: repo.load(StorageKey::Settings, Settings::default()).await,
        auth: repo.load(StorageKey::Auth, AuthState::signed_out()).await,
        order_sequence,
    }
}
