mod locks;
mod rooms;

use std::{future::Future, sync::Arc};

use tokio::{
    sync::{RwLock, watch},
    time::timeout,
};
use uuid::Uuid;

use crate::{config::AppConfig, dao::Store, error::ServiceError};

pub use self::locks::AggregateLocks;
pub use self::rooms::{ConnectionId, RoomEvent, RoomHub};

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, chat rooms and configuration.
pub struct AppState {
    store: RwLock<Option<Arc<dyn Store>>>,
    degraded: watch::Sender<bool>,
    rooms: RoomHub,
    locks: AggregateLocks,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            rooms: RoomHub::new(config.room_capacity),
            locks: AggregateLocks::new(),
            config,
        })
    }

    /// Build a state with `store` already installed.
    pub async fn with_store(config: AppConfig, store: Arc<dyn Store>) -> SharedState {
        let state = Self::new(config);
        state.set_store(store).await;
        state
    }

    /// Current store, or [`ServiceError::Degraded`] while none is usable.
    pub async fn store(&self) -> Result<Arc<dyn Store>, ServiceError> {
        if *self.degraded.borrow() {
            return Err(ServiceError::Degraded);
        }
        let guard = self.store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn Store>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
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
        if self.is_degraded() == value {
            return;
        }
        self.degraded.send_replace(value);
    }

    /// Chat rooms, one per group.
    pub fn rooms(&self) -> &RoomHub {
        &self.rooms
    }

    /// Run `work` while holding the gate of aggregate `id`.
    ///
    /// Fails with [`ServiceError::Timeout`] when the gate cannot be taken in time.
    pub async fn serialized<F, Fut, T>(&self, id: Uuid, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let guard = timeout(self.config.lock_timeout(), self.locks.acquire(id))
            .await
            .map_err(|_| ServiceError::Timeout)?;
        let outcome = work().await;
        drop(guard);
        self.locks.release(id);
        outcome
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::memory::MemoryStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(state.store().await, Err(ServiceError::Degraded)));

        state.set_store(Arc::new(MemoryStore::new())).await;
        assert!(!state.is_degraded());
        assert!(state.store().await.is_ok());

        state.update_degraded(true);
        assert!(matches!(state.store().await, Err(ServiceError::Degraded)));
    }

    #[tokio::test]
    async fn serialized_work_times_out_behind_a_held_gate() {
        let config = AppConfig {
            lock_timeout_ms: 20,
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        let id = Uuid::new_v4();
        let _held = state.locks.acquire(id).await;

        let outcome = state.serialized(id, || async { Ok(()) }).await;
        assert!(matches!(outcome, Err(ServiceError::Timeout)));

        let other = state.serialized(Uuid::new_v4(), || async { Ok(7) }).await;
        assert_eq!(other.unwrap(), 7);
    }
}
