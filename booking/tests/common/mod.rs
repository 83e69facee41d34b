//! Shared setup for the booking integration suites.

#![allow(dead_code)] // Each suite uses a different subset
#![allow(clippy::panic)]

use staybook_booking::config::BookingConfig;
use staybook_booking::mocks::MockServices;
use staybook_booking::persistence::{MemoryStorage, SessionStorage};
use staybook_booking::{BookingState, BookingStore};
use staybook_testing::{fixtures, test_clock};
use std::sync::Arc;
use std::time::Duration;

/// A store wired to mocks, plus handles to inspect them
pub struct Harness {
    pub services: MockServices,
    pub storage: Arc<MemoryStorage>,
    pub store: BookingStore,
}

pub fn harness() -> Harness {
    harness_with(MockServices::new(), Arc::new(MemoryStorage::new()))
}

pub fn harness_with(services: MockServices, storage: Arc<MemoryStorage>) -> Harness {
    let shared: Arc<dyn SessionStorage> = storage.clone();
    let store = BookingStore::new(
        BookingState::new(fixtures::property()),
        services.environment(Arc::new(test_clock()), BookingConfig::default()),
        shared,
    );
    Harness {
        services,
        storage,
        store,
    }
}

impl Harness {
    pub async fn settle(&self) {
        self.store
            .settle(Duration::from_secs(60))
            .await
            .unwrap_or_else(|error| panic!("store did not settle: {error}"));
    }

    /// Value stored under the villa's scoped key
    pub fn stored(&self, key: &str) -> Option<String> {
        self.storage.entries().get(&format!("booking:villa-sol:{key}")).cloned()
    }
}

/// Step (paused) time a millisecond at a time until `condition` holds
pub async fn until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition never became true");
}
