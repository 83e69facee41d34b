//! The booking session store.
//!
//! Owns the session state and runs the reducer's effects:
//!
//! - `Future`: spawned; its action is broadcast, then fed back into the store
//! - `Debounce`: scheduled on the [`Scheduler`], replacing any pending timer
//!   under the same key
//! - `Cancel`: aborts the pending timer
//! - `Persist`: written to session storage before `send` returns
//!
//! Actions serialize on the state lock. Gateway replies may arrive in any
//! order; the reducer decides which ones still matter.

use crate::actions::BookingAction;
use crate::environment::BookingEnvironment;
use crate::error::StoreError;
use crate::persistence::{QueryParams, RestoredSession, SessionPersistence, SessionStorage};
use crate::reducer::BookingReducer;
use crate::scheduler::Scheduler;
use crate::state::BookingState;
use staybook_core::effect::Effect;
use staybook_core::reducer::Reducer;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

/// Decrements the pending-effect counter when dropped, including when a
/// timer task is aborted
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn track(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store for one booking session
#[derive(Clone)]
pub struct BookingStore {
    state: Arc<RwLock<BookingState>>,
    reducer: BookingReducer,
    environment: BookingEnvironment,
    persistence: SessionPersistence,
    scheduler: Scheduler,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    /// Actions produced by effects, for observers
    action_broadcast: broadcast::Sender<BookingAction>,
}

impl std::fmt::Debug for BookingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStore")
            .field("environment", &self.environment)
            .field("pending_effects", &self.pending_effects.load(Ordering::Relaxed))
            .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl BookingStore {
    /// Create a store for `initial_state`, persisting into `storage`
    ///
    /// Storage keys are scoped to the state's property slug.
    #[must_use]
    pub fn new(
        initial_state: BookingState,
        environment: BookingEnvironment,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(64);
        let persistence = SessionPersistence::new(storage, initial_state.property.slug.clone());

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: BookingReducer::new(),
            environment,
            persistence,
            scheduler: Scheduler::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            action_broadcast,
        }
    }

    /// Start the session: recover the selection from `query` (preferred)
    /// and storage, then load availability and exchange rates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn mount(&self, query: &dyn QueryParams) -> Result<(), StoreError> {
        let restored = RestoredSession::rehydrate(query, &self.persistence);
        self.send(BookingAction::Mounted { restored }).await
    }

    /// Send an action to the store
    ///
    /// The reducer runs under the write lock. Persistence writes are applied
    /// before this returns; everything else runs in the background.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    #[tracing::instrument(skip(self, action), name = "booking_send", fields(action = action.name()))]
    pub async fn send(&self, action: BookingAction) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("booking.actions.total", "action" => action.name()).increment(1);

        let effects = {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut state, action, &self.environment)
        };

        tracing::trace!("Reducer returned {} effects", effects.len());
        for effect in effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&self, effect: Effect<BookingAction>) {
        metrics::counter!("booking.effects.executed", "type" => effect.kind()).increment(1);

        match effect {
            Effect::None => {}
            Effect::Future(fut) => {
                let pending = PendingGuard::track(&self.pending_effects);
                let store = self.clone();

                tokio::spawn(async move {
                    let _pending = pending;
                    if let Some(action) = fut.await {
                        let _ = store.action_broadcast.send(action.clone());
                        let _ = store.send(action).await;
                    }
                });
            }
            Effect::Debounce {
                key,
                duration,
                action,
            } => {
                let pending = PendingGuard::track(&self.pending_effects);
                let store = self.clone();

                self.scheduler.schedule(key, duration, async move {
                    let _pending = pending;
                    let _ = store.action_broadcast.send((*action).clone());
                    let _ = store.send(*action).await;
                });
            }
            Effect::Cancel(key) => {
                self.scheduler.cancel(key);
            }
            Effect::Persist(write) => self.persistence.apply(&write),
        }
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let total = store.state(|s| s.display_quote().map(|q| q.total)).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&BookingState) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Observe actions produced by effects
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<BookingAction> {
        self.action_broadcast.subscribe()
    }

    /// Environment the reducer runs with
    #[must_use]
    pub const fn environment(&self) -> &BookingEnvironment {
        &self.environment
    }

    /// Effects and timers still running
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::Acquire)
    }

    /// Wait until no effect or timer is left running, including the ones
    /// their feedback actions start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if work is still pending after `timeout`.
    pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
        let poll = async {
            while self.pending_effects.load(Ordering::Acquire) > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| StoreError::Timeout)
    }

    /// Stop accepting actions, cancel pending timers and wait for in-flight
    /// effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running after
    /// `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("Shutting down booking store");
        self.shutdown.store(true, Ordering::Release);
        self.scheduler.cancel_all();

        let result = self.settle(timeout).await;
        if result.is_err() {
            tracing::error!(
                pending_effects = self.pending_effects(),
                "Shutdown timeout: effects still running"
            );
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BookingConfig;
    use crate::mocks::MockServices;
    use crate::persistence::{MemoryStorage, QueryString};
    use staybook_testing::{day, fixtures, test_clock};

    fn store(services: &MockServices, storage: Arc<MemoryStorage>) -> BookingStore {
        BookingStore::new(
            BookingState::new(fixtures::property()),
            services.environment(Arc::new(test_clock()), BookingConfig::default()),
            storage,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn mount_loads_availability_then_prices_restored_stay() {
        let services = MockServices::new();
        let store = store(&services, Arc::new(MemoryStorage::new()));

        store
            .mount(&QueryString::parse("checkIn=2026-03-10&checkOut=2026-03-13&guests=2"))
            .await
            .unwrap();
        store.settle(Duration::from_secs(5)).await.unwrap();

        let (stay, total) = store
            .state(|s| (s.stay(), s.pricing.as_ref().map(|p| p.total)))
            .await;
        assert_eq!(stay, Some((day(10), day(13))));
        assert_eq!(total, Some(350.0));
        assert_eq!(services.availability.calls(), 1);
        assert_eq!(services.pricing.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn date_changes_are_persisted_before_send_returns() {
        let services = MockServices::new();
        let storage = Arc::new(MemoryStorage::new());
        let store = store(&services, Arc::clone(&storage));

        store.send(BookingAction::SetCheckIn(Some(day(10)))).await.unwrap();

        assert_eq!(
            storage.entries().get("booking:villa-sol:checkIn").map(String::as_str),
            Some("2026-03-10")
        );
        store.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_rejects_further_actions() {
        let services = MockServices::new();
        let store = store(&services, Arc::new(MemoryStorage::new()));

        store.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(
            store.send(BookingAction::Reset).await,
            Err(StoreError::ShutdownInProgress)
        );
    }
}
