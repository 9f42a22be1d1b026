pub mod commands;
pub mod placement;
pub mod roster;
pub mod save_status;
pub mod selectors;
pub mod store;

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, MutexGuard, RwLock, watch};

use crate::{
    config::AppConfig, dao::roster_store::RosterRepository, error::ServiceError,
};

pub use self::save_status::{SaveStatus, SaveStatusTracker};
pub use self::store::RosterStore;

pub type SharedState = Arc<AppState>;

/// Central application state: repository handle, division snapshot and save indicator.
pub struct AppState {
    repository: RwLock<Option<Arc<dyn RosterRepository>>>,
    rosters: RosterStore,
    save_status: SaveStatusTracker,
    config: Arc<AppConfig>,
    degraded: watch::Sender<bool>,
    mutation_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a repository is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            repository: RwLock::new(None),
            rosters: RosterStore::new(config.roster_policy()),
            save_status: SaveStatusTracker::new(config.save_status_reset()),
            config: Arc::new(config),
            degraded: degraded_tx,
            mutation_gate: Mutex::new(()),
        })
    }

    /// Obtain a handle to the current repository, if one is installed.
    pub async fn repository(&self) -> Option<Arc<dyn RosterRepository>> {
        let guard = self.repository.read().await;
        guard.as_ref().cloned()
    }

    /// Repository handle or [`ServiceError::Degraded`] while storage is unreachable.
    pub async fn require_repository(&self) -> Result<Arc<dyn RosterRepository>, ServiceError> {
        self.repository().await.ok_or(ServiceError::Degraded)
    }

    /// Install a repository implementation and leave degraded mode.
    pub async fn set_repository(&self, repository: Arc<dyn RosterRepository>) {
        {
            let mut guard = self.repository.write().await;
            *guard = Some(repository);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Canonical division snapshot.
    pub fn rosters(&self) -> &RosterStore {
        &self.rosters
    }

    pub fn save_status(&self) -> &SaveStatusTracker {
        &self.save_status
    }

    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    pub fn write_timeout(&self) -> Duration {
        self.config.write_timeout()
    }

    /// Serialises read-modify-write cycles issued by this process.
    pub async fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation_gate.lock().await
    }
}
