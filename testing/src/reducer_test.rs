//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use bashi_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use bashi_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(CheckoutReducer)
///     .with_env(test_environment())
///     .given_state(CheckoutState::default())
///     .when_action(CheckoutAction::Submit)
///     .then_state(|state| {
///         assert!(state.phase.is_pending());
///     })
///     .then_effects(|effects| {
///         assertions::assert_has_cancellable_effect(effects, "checkout");
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    preceding: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
    A: Clone,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            preceding: Vec::new(),
            action: None,
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

    /// Apply `action` to the initial state before the action under test
    ///
    /// Effects returned for preceding actions are discarded.
    #[must_use]
    pub fn given_action(mut self, action: A) -> Self {
        self.preceding.push(action);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
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

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for earlier in self.preceding {
            let _ = self.reducer.reduce(&mut state, earlier, &env);
        }

        // Execute reducer
        let effects = self.reducer.reduce(&mut state, action, &env);

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&state);
        }

        // Run effect assertions
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use bashi_core::effect::Effect;

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

    /// Assert that effects contain at least one Stream effect
    ///
    /// Cancellable wrappers are looked through.
    ///
    /// # Panics
    ///
    /// Panics if no Stream effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_stream_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| match e {
                Effect::Stream(_) => true,
                Effect::Cancellable { effect, .. } => matches!(**effect, Effect::Stream(_)),
                _ => false,
            }),
            "Expected at least one Stream effect, but none found"
        );
    }

    /// Assert that an effect is registered as cancellable under `id`
    ///
    /// # Panics
    ///
    /// Panics if no Cancellable effect with that id is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancellable_effect<A: std::fmt::Debug>(effects: &[Effect<A>], id: &str) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancellable { id: found, .. } if found.as_str() == id)),
            "Expected a Cancellable effect with id {id:?}, found {effects:?}"
        );
    }

    /// Assert that effects cancel the effect registered under `id`
    ///
    /// # Panics
    ///
    /// Panics if no Cancel effect with that id is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A: std::fmt::Debug>(effects: &[Effect<A>], id: &str) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancel(found) if found.as_str() == id)),
            "Expected Effect::Cancel({id:?}), found {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashi_core::effect::Effect;
    use bashi_core::reducer::Reducer;

    #[derive(Clone, Debug)]
    struct SeatState {
        held: u32,
    }

    #[derive(Clone, Debug)]
    enum SeatAction {
        Hold,
        Release,
        Watch,
        StopWatching,
    }

    struct SeatReducer;

    struct NoEnv;

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = NoEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SeatAction::Hold => {
                    state.held = state.held.saturating_add(1);
                    smallvec::smallvec![Effect::None]
                }
                SeatAction::Release => {
                    state.held = state.held.saturating_sub(1);
                    smallvec::smallvec![Effect::None]
                }
                SeatAction::Watch => smallvec::smallvec![
                    Effect::Stream(Box::pin(one_hold())).cancellable("watch")
                ],
                SeatAction::StopWatching => smallvec::smallvec![Effect::Cancel("watch".into())],
            }
        }
    }

    fn one_hold() -> impl futures::Stream<Item = SeatAction> + Send {
        futures::stream::iter(vec![SeatAction::Hold])
    }

    #[test]
    fn hold_adds_one_seat() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState { held: 0 })
            .when_action(SeatAction::Hold)
            .then_state(|state| {
                assert_eq!(state.held, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn release_frees_one_seat() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState { held: 5 })
            .when_action(SeatAction::Release)
            .then_state(|state| {
                assert_eq!(state.held, 4);
            })
            .run();
    }

    #[test]
    fn no_effects_accepts_none_and_empty() {
        assertions::assert_no_effects::<SeatAction>(&[Effect::None]);
        assertions::assert_no_effects::<SeatAction>(&[]);
    }

    #[test]
    fn effects_count_matches_len() {
        assertions::assert_effects_count(&[Effect::<SeatAction>::None], 1);
        assertions::assert_effects_count::<SeatAction>(&[], 0);
    }

    #[test]
    fn given_actions_run_first() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState { held: 0 })
            .given_action(SeatAction::Hold)
            .given_action(SeatAction::Hold)
            .when_action(SeatAction::Release)
            .then_state(|state| {
                assert_eq!(state.held, 1);
            })
            .run();
    }

    #[test]
    fn stream_and_cancel_assertions() {
        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState { held: 0 })
            .when_action(SeatAction::Watch)
            .then_effects(|effects| {
                assertions::assert_has_stream_effect(effects);
                assertions::assert_has_cancellable_effect(effects, "watch");
            })
            .run();

        ReducerTest::new(SeatReducer)
            .with_env(NoEnv)
            .given_state(SeatState { held: 0 })
            .when_action(SeatAction::StopWatching)
            .then_effects(|effects| {
                assertions::assert_cancels(effects, "watch");
            })
            .run();
    }
}
