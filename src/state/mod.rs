mod session;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::arcade_store::ArcadeStore, error::ServiceError};

pub use self::session::{Session, SessionRegistry};

pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle, sessions and configuration.
pub struct AppState {
    store: RwLock<Option<Arc<dyn ArcadeStore>>>,
    sessions: SessionRegistry,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            sessions: SessionRegistry::new(config.session_ttl),
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn ArcadeStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store or [`ServiceError::Degraded`] when none is installed or it is unhealthy.
    pub async fn require_store(&self) -> Result<Arc<dyn ArcadeStore>, ServiceError> {
        if *self.degraded.borrow() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn ArcadeStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::arcade_store::memory::MemoryArcadeStore;

    #[tokio::test]
    async fn installing_a_store_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state.set_store(Arc::new(MemoryArcadeStore::new())).await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_store().await.is_ok());

        state.clear_store().await;
        assert!(state.is_degraded());
        assert!(state.store().await.is_none());
    }
}
