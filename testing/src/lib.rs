//! # Staybook Testing
//!
//! Test helpers for the Staybook booking engine.
//!
//! This crate provides:
//! - [`FixedClock`]: deterministic "now" and "today"
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`fixtures`]: a sample property, pricing snapshots and guest details
//! - [`strategies`]: proptest strategies for stays and guest counts
//!
//! Gateway mocks live next to the gateway traits, in
//! `staybook_booking::mocks`.
//!
//! ## Example
//!
//! ```
//! use staybook_testing::{day, fixtures, test_clock};
//! use staybook_core::environment::Clock;
//!
//! let clock = test_clock();
//! assert_eq!(clock.today(), day(fixtures::TODAY_DAY));
//! assert_eq!(fixtures::property().default_minimum_stay, 2);
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use staybook_core::environment::Clock;

pub mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until [`FixedClock::set`] moves it.
    ///
    /// # Example
    ///
    /// ```
    /// use staybook_testing::mocks::FixedClock;
    /// use staybook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2026-03-01 09:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Day `n` of March 2026, the month [`test_clock`] lives in
///
/// # Panics
///
/// Panics if `n` is not a day of March.
#[must_use]
#[allow(clippy::expect_used)]
pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, n).expect("day of March 2026")
}

/// Sample domain values shared across test suites
pub mod fixtures {
    use staybook_core::currency::CurrencyCode;
    use staybook_core::guest::GuestInfo;
    use staybook_core::pricing::PricingSnapshot;
    use staybook_core::property::Property;

    /// Day of March [`super::test_clock`] reports as today
    pub const TODAY_DAY: u32 = 1;

    /// Villa Sol: EUR, sleeps 4 (max 6), two-night minimum, 50 EUR
    /// refundable 24-hour hold
    #[must_use]
    pub fn property() -> Property {
        Property {
            id: "prop-1".to_string(),
            slug: "villa-sol".to_string(),
            name: "Villa Sol".to_string(),
            base_currency: CurrencyCode::new("EUR"),
            base_occupancy: 4,
            max_guests: 6,
            default_minimum_stay: 2,
            hold_fee_amount: 50.0,
            hold_duration_hours: 24,
            hold_fee_refundable: true,
        }
    }

    /// EUR snapshot with a 50 EUR cleaning fee and nothing else on top
    #[must_use]
    pub fn snapshot(nights: u32, accommodation_total: f64) -> PricingSnapshot {
        PricingSnapshot {
            number_of_nights: nights,
            accommodation_total,
            cleaning_fee: 50.0,
            extra_guest_fee_total: 0.0,
            taxes: 0.0,
            length_of_stay_discount: None,
            coupon_discount: None,
            total: accommodation_total + 50.0,
            currency: CurrencyCode::new("EUR"),
        }
    }

    /// Complete, valid guest details
    #[must_use]
    pub fn guest_info() -> GuestInfo {
        GuestInfo {
            first_name: "Ana".to_string(),
            last_name: "Popescu".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+40 721 000 111".to_string(),
            message: None,
        }
    }
}

/// Property-based testing strategies
pub mod strategies {
    use super::day;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    /// A day in March 2026 after the test clock's today
    pub fn future_day() -> impl Strategy<Value = NaiveDate> {
        (2u32..=31).prop_map(day)
    }

    /// A `(check_in, check_out)` pair in March 2026 with check-out after
    /// check-in; may be shorter than the minimum stay
    pub fn stay() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
        (2u32..=30)
            .prop_flat_map(|check_in| (Just(check_in), (check_in + 1)..=31))
            .prop_map(|(check_in, check_out)| (day(check_in), day(check_out)))
    }

    /// Requested guest counts, including out-of-range ones
    pub fn guest_count() -> impl Strategy<Value = u32> {
        0u32..=12
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(clock.today(), day(fixtures::TODAY_DAY));
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let clock = test_clock();
        let later = clock.now() + chrono::Duration::days(2);
        clock.set(later);
        assert_eq!(clock.today(), day(3));
    }
}
