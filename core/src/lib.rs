//! # Staybook Core
//!
//! Pure domain types and rules for the Staybook booking engine.
//!
//! Nothing in this crate performs I/O. It provides:
//!
//! - **Dates**: which check-in/check-out dates are selectable for a property
//! - **Currency**: rate-table conversion and price formatting
//! - **Pricing**: the server pricing snapshot and the quote derived from it
//! - **Guest**: guest contact details and their validation
//! - **Reducer / Effect**: the `(State, Action, Environment) → (State, Effects)`
//!   contract the booking engine is written against
//!
//! ## Example
//!
//! ```
//! use staybook_core::dates::{nights, DateConstraints};
//! use chrono::NaiveDate;
//! use std::collections::BTreeSet;
//!
//! let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
//! let blocked: BTreeSet<_> = [NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()].into();
//! let constraints = DateConstraints::new(&blocked, today, 2);
//!
//! assert!(constraints.is_check_in_disabled(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()));
//! assert_eq!(nights(today, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()), 3);
//! ```

pub mod currency;
pub mod dates;
pub mod error;
pub mod guest;
pub mod pricing;
pub mod property;
pub mod storage;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the business logic contract
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never await and never touch the network; anything asynchronous is
/// described as an [`Effect`](crate::effect::Effect) and executed by the store.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for BookingReducer {
    ///     type State = BookingState;
    ///     type Action = BookingAction;
    ///     type Environment = BookingEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut BookingState,
    ///         action: BookingAction,
    ///         env: &BookingEnvironment,
    ///     ) -> SmallVec<[Effect<BookingAction>; 4]> {
    ///         SmallVec::new()
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns effect descriptions for the
        /// runtime to execute. Must not block or panic.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values, not execution. The booking store interprets them:
/// futures are spawned, debounced actions are scheduled on a cancellable
/// timer, and persistence writes are applied synchronously.
pub mod effect {
    use crate::storage::SessionWrite;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifies a cancellable timer slot
    ///
    /// Scheduling a debounced action under a key that already has a pending
    /// timer replaces (and cancels) the pending one.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum TimerKey {
        /// The auto-pricing debounce timer
        Pricing,
    }

    impl std::fmt::Display for TimerKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Pricing => write!(f, "pricing"),
            }
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Dispatch `action` after `duration` unless the timer under `key`
        /// is cancelled or replaced first
        Debounce {
            /// Timer slot
            key: TimerKey,
            /// How long the input has to settle
            duration: Duration,
            /// Action to dispatch when the timer fires
            action: Box<Action>,
        },

        /// Cancel the pending timer under this key, if any
        Cancel(TimerKey),

        /// Mirror a session value into persisted storage
        ///
        /// Applied synchronously by the store before `send` returns.
        Persist(SessionWrite),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Debounce {
                    key,
                    duration,
                    action,
                } => f
                    .debug_struct("Effect::Debounce")
                    .field("key", key)
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Cancel(key) => f.debug_tuple("Effect::Cancel").field(key).finish(),
                Effect::Persist(write) => f.debug_tuple("Effect::Persist").field(write).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block as an effect
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Short label for logs and metrics
        #[must_use]
        pub const fn kind(&self) -> &'static str {
            match self {
                Effect::None => "none",
                Effect::Future(_) => "future",
                Effect::Debounce { .. } => "debounce",
                Effect::Cancel(_) => "cancel",
                Effect::Persist(_) => "persist",
            }
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, NaiveDate, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;

        /// The current calendar day
        ///
        /// All date rules compare calendar days, never instants.
        fn today(&self) -> NaiveDate {
            self.now().date_naive()
        }
    }

    /// Production clock backed by the system time
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, TimerKey};
    use super::storage::{SessionKey, SessionWrite};

    #[test]
    fn effect_kind_labels() {
        let debounce: Effect<u8> = Effect::Debounce {
            key: TimerKey::Pricing,
            duration: std::time::Duration::from_millis(500),
            action: Box::new(1),
        };
        assert_eq!(debounce.kind(), "debounce");
        assert_eq!(Effect::<u8>::Cancel(TimerKey::Pricing).kind(), "cancel");
        assert_eq!(
            Effect::<u8>::Persist(SessionWrite::remove(SessionKey::CheckIn)).kind(),
            "persist"
        );
    }

    #[test]
    fn effect_debug_hides_future() {
        let effect: Effect<u8> = Effect::future(async { Some(1) });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }
}
