//! Given-When-Then harness for reducers
//!
//! Runs a reducer synchronously against a prepared state, without a store,
//! and hands the resulting state and effects to assertions.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use staybook_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Several `when_action` calls reduce in order; effect assertions see the
/// effects of the last action only.
///
/// # Example
///
/// ```ignore
/// use staybook_testing::ReducerTest;
///
/// ReducerTest::new(BookingReducer::new())
///     .with_env(env)
///     .given_state(BookingState::new(property()))
///     .when_action(BookingAction::SetGuestCount(3))
///     .then_state(|state| assert_eq!(state.guest_count, 3))
///     .then_effects(|effects| assert_effects_count(effects, 2))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Queue an action (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test, execute all assertions and return the final state
    ///
    /// # Panics
    ///
    /// Panics if the initial state, environment or actions are missing,
    /// or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) -> S {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");
        let env = self
            .environment
            .expect("Environment must be set with with_env()");
        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
        state
    }
}

/// Helper assertions for effects
pub mod assertions {
    use staybook_core::effect::{Effect, TimerKey};
    use staybook_core::storage::SessionKey;
    use std::time::Duration;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Find the debounce armed under `key`
    ///
    /// # Panics
    ///
    /// Panics if no such debounce is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn debounced<A: Clone>(effects: &[Effect<A>], key: TimerKey) -> (Duration, A) {
        effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Debounce {
                    key: armed,
                    duration,
                    action,
                } if *armed == key => Some((*duration, action.as_ref().clone())),
                _ => None,
            })
            .unwrap_or_else(|| panic!("Expected a debounce on the {key} timer, but none found"))
    }

    /// Assert that the timer under `key` is cancelled
    ///
    /// # Panics
    ///
    /// Panics if no matching cancel is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A>(effects: &[Effect<A>], key: TimerKey) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancel(cancelled) if *cancelled == key)),
            "Expected the {key} timer to be cancelled"
        );
    }

    /// The value written under `key`: `Some(Some(v))` for a set,
    /// `Some(None)` for a removal, `None` when the key is not written
    #[must_use]
    pub fn persisted<A>(effects: &[Effect<A>], key: SessionKey) -> Option<Option<String>> {
        effects.iter().find_map(|effect| match effect {
            Effect::Persist(write) if write.key == key => Some(write.value.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staybook_core::effect::{Effect, TimerKey};
    use staybook_core::reducer::Reducer;
    use staybook_core::storage::{SessionKey, SessionWrite};
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Type(char),
        Fire,
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = String;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Type(c) => {
                    state.push(c);
                    smallvec::smallvec![
                        Effect::Persist(SessionWrite::set(SessionKey::Action, state.clone())),
                        Effect::Debounce {
                            key: TimerKey::Pricing,
                            duration: Duration::from_millis(500),
                            action: Box::new(TestAction::Fire),
                        }
                    ]
                }
                TestAction::Fire => smallvec::smallvec![Effect::Cancel(TimerKey::Pricing)],
            }
        }
    }

    #[test]
    fn actions_reduce_in_order() {
        let state = ReducerTest::new(TestReducer)
            .with_env(())
            .given_state(String::new())
            .when_action(TestAction::Type('a'))
            .when_action(TestAction::Type('b'))
            .then_state(|state| assert_eq!(state, "ab"))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assert_eq!(
                    assertions::persisted(effects, SessionKey::Action),
                    Some(Some("ab".to_string()))
                );
                let (duration, action) = assertions::debounced(effects, TimerKey::Pricing);
                assert_eq!(duration, Duration::from_millis(500));
                assert_eq!(action, TestAction::Fire);
            })
            .run();
        assert_eq!(state, "ab");
    }

    #[test]
    fn effect_assertions_see_last_action_only() {
        ReducerTest::new(TestReducer)
            .with_env(())
            .given_state(String::new())
            .when_action(TestAction::Type('a'))
            .when_action(TestAction::Fire)
            .then_effects(|effects| {
                assertions::assert_cancels(effects, TimerKey::Pricing);
                assert_eq!(assertions::persisted(effects, SessionKey::Action), None);
            })
            .run();
    }

    #[test]
    fn no_effects_accepts_lone_none() {
        assertions::assert_no_effects::<TestAction>(&[Effect::None]);
        assertions::assert_no_effects::<TestAction>(&[]);
    }
}
