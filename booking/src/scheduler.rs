//! Cancellable, keyed timers.
//!
//! The store uses one slot per [`TimerKey`]. Scheduling into an occupied
//! slot aborts the pending task, which is what turns a stream of rapid
//! inputs into a single debounced action.

use staybook_core::effect::TimerKey;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

#[derive(Debug)]
struct PendingTimer {
    id: u64,
    handle: AbortHandle,
}

/// Keyed timer slots backed by spawned tokio tasks
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    timers: Arc<Mutex<HashMap<TimerKey, PendingTimer>>>,
    next_id: Arc<AtomicU64>,
}

impl Scheduler {
    /// Create an empty scheduler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_fire` after `delay`, replacing any timer pending under `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: TimerKey, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);

        let mut slots = self.timers.lock().unwrap_or_else(PoisonError::into_inner);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Free the slot before firing so `on_fire` may schedule again
            // under the same key without aborting itself.
            {
                let mut slots = timers.lock().unwrap_or_else(PoisonError::into_inner);
                if slots.get(&key).is_some_and(|pending| pending.id == id) {
                    slots.remove(&key);
                }
            }

            tracing::trace!(timer = %key, "Timer fired");
            on_fire.await;
        });

        if let Some(previous) = slots.insert(
            key,
            PendingTimer {
                id,
                handle: task.abort_handle(),
            },
        ) {
            tracing::trace!(timer = %key, "Replacing pending timer");
            previous.handle.abort();
        }
    }

    /// Cancel the timer pending under `key`. Returns whether one was pending.
    pub fn cancel(&self, key: TimerKey) -> bool {
        let removed = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);

        removed.is_some_and(|pending| {
            tracing::trace!(timer = %key, "Timer cancelled");
            pending.handle.abort();
            true
        })
    }

    /// Whether a timer is pending under `key`
    #[must_use]
    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Cancel every pending timer
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        for (_, pending) in drained {
            pending.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_future(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(TimerKey::Pricing, Duration::from_millis(500), counter_future(&fired));
        assert!(scheduler.is_pending(TimerKey::Pricing));

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending(TimerKey::Pricing));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_restarts_the_window() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            scheduler.schedule(TimerKey::Pricing, Duration::from_millis(500), counter_future(&fired));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(TimerKey::Pricing, Duration::from_millis(500), counter_future(&fired));
        assert!(scheduler.cancel(TimerKey::Pricing));
        assert!(!scheduler.cancel(TimerKey::Pricing));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn firing_callback_can_reschedule_same_key() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let inner_scheduler = scheduler.clone();
        let inner_fired = Arc::clone(&fired);
        scheduler.schedule(TimerKey::Pricing, Duration::from_millis(100), async move {
            inner_fired.fetch_add(1, Ordering::SeqCst);
            inner_scheduler.schedule(TimerKey::Pricing, Duration::from_millis(100), counter_future(&inner_fired));
        });

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
