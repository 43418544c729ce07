//! Identity loading for a session.
//!
//! The loader asks an [`IdentityService`] exactly once. Whatever happens, it
//! ends up holding an [`IdentityOutcome`]: the verified identity, or the
//! guest identity when the lookup failed. Failures are logged and absorbed;
//! callers never see them as errors.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tasklist_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use thiserror::Error;

/// Who is using the list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name
    pub name: String,
    /// Numeric user id; `0` for the guest
    pub id: u64,
    /// Whether the identity came from the identity service
    pub verified: bool,
}

impl Identity {
    /// A verified identity
    #[must_use]
    pub fn verified(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
            verified: true,
        }
    }

    /// The guest identity used when the lookup fails
    #[must_use]
    pub fn guest() -> Self {
        Self {
            name: "Guest User".to_string(),
            id: 0,
            verified: false,
        }
    }
}

/// Result of the single identity lookup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityOutcome {
    /// The service answered
    Verified(Identity),
    /// The service failed; the guest identity stands in
    Fallback(Identity),
}

impl IdentityOutcome {
    /// The identity, whichever way it was obtained
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        match self {
            Self::Verified(identity) | Self::Fallback(identity) => identity,
        }
    }

    /// Returns `true` if the guest identity was substituted
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Phase of the loader
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityStatus {
    /// No answer yet
    #[default]
    Loading,
    /// Terminal: the lookup finished one way or the other
    Resolved(IdentityOutcome),
}

/// State of the identity loader
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityState {
    status: IdentityStatus,
    requested: bool,
}

impl IdentityState {
    /// Fresh loader, nothing requested yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    #[must_use]
    pub const fn status(&self) -> &IdentityStatus {
        &self.status
    }

    /// Returns `true` until the lookup resolves
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, IdentityStatus::Loading)
    }

    /// Returns `true` once the lookup resolved
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !self.is_loading()
    }

    /// Returns `true` once the lookup has been started
    #[must_use]
    pub const fn is_requested(&self) -> bool {
        self.requested
    }

    /// The outcome, once resolved
    #[must_use]
    pub const fn outcome(&self) -> Option<&IdentityOutcome> {
        match &self.status {
            IdentityStatus::Loading => None,
            IdentityStatus::Resolved(outcome) => Some(outcome),
        }
    }

    /// The identity, once resolved
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.outcome().map(IdentityOutcome::identity)
    }
}

/// Actions accepted by the identity reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityAction {
    /// Command: start the lookup; ignored after the first time
    Load,
    /// Event: the lookup finished
    Resolved {
        /// What the lookup produced
        outcome: IdentityOutcome,
    },
}

/// Failure reported by an identity service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The service could not be reached or refused the request
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Source of the current user's identity
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` so it can be used as `Arc<dyn IdentityService>`.
pub trait IdentityService: Send + Sync {
    /// Look up the current user
    fn fetch(&self) -> Pin<Box<dyn Future<Output = Result<Identity, IdentityError>> + Send + '_>>;
}

/// Stand-in for a remote identity service
///
/// Answers after a fixed latency and fails with a configurable probability.
#[derive(Debug)]
pub struct SimulatedIdentityService {
    identity: Identity,
    latency: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedIdentityService {
    /// Default latency of a lookup
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

    /// Default probability that a lookup fails
    pub const DEFAULT_FAILURE_RATE: f64 = 0.1;

    /// Service answering with `Demo User` (id 123) under the default latency
    /// and failure rate
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: Identity::verified("Demo User", 123),
            latency: Self::DEFAULT_LATENCY,
            failure_rate: Self::DEFAULT_FAILURE_RATE,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Identity returned on success
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Time each lookup takes
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Probability of failure, clamped to `0.0..=1.0`
    #[must_use]
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        self
    }

    /// Reproducible failures
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Configured latency
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }

    fn roll_failure(&self) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_bool(self.failure_rate)
    }
}

impl Default for SimulatedIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityService for SimulatedIdentityService {
    fn fetch(&self) -> Pin<Box<dyn Future<Output = Result<Identity, IdentityError>> + Send + '_>> {
        let fails = self.roll_failure();
        let latency = self.latency;

        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if fails {
                Err(IdentityError::Unavailable("API Error".to_string()))
            } else {
                Ok(self.identity.clone())
            }
        })
    }
}

/// Environment dependencies for the identity reducer
#[derive(Clone)]
pub struct IdentityEnvironment {
    /// Where the identity comes from
    pub service: Arc<dyn IdentityService>,
}

impl IdentityEnvironment {
    /// Creates a new `IdentityEnvironment`
    #[must_use]
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }
}

impl std::fmt::Debug for IdentityEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for the identity loader
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityReducer;

impl IdentityReducer {
    /// Creates a new `IdentityReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for IdentityReducer {
    type State = IdentityState;
    type Action = IdentityAction;
    type Environment = IdentityEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            IdentityAction::Load => {
                if state.requested {
                    tracing::debug!("Identity already requested, ignoring load");
                    return smallvec![Effect::None];
                }
                state.requested = true;

                let service = Arc::clone(&env.service);
                smallvec![Effect::future(async move {
                    let outcome = match service.fetch().await {
                        Ok(identity) => IdentityOutcome::Verified(identity),
                        Err(error) => {
                            tracing::warn!(%error, "Identity lookup failed, using guest identity");
                            IdentityOutcome::Fallback(Identity::guest())
                        },
                    };
                    Some(IdentityAction::Resolved { outcome })
                })]
            },

            IdentityAction::Resolved { outcome } => {
                if state.is_resolved() {
                    tracing::debug!("Identity already resolved, ignoring");
                } else {
                    tracing::info!(
                        name = %outcome.identity().name,
                        fallback = outcome.is_fallback(),
                        "Identity resolved"
                    );
                    state.status = IdentityStatus::Resolved(outcome);
                }
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use tasklist_testing::{ReducerTest, assertions};

    fn env_with(service: SimulatedIdentityService) -> IdentityEnvironment {
        IdentityEnvironment::new(Arc::new(service))
    }

    fn always_succeeds() -> SimulatedIdentityService {
        SimulatedIdentityService::new()
            .with_latency(Duration::ZERO)
            .with_failure_rate(0.0)
    }

    fn always_fails() -> SimulatedIdentityService {
        SimulatedIdentityService::new()
            .with_latency(Duration::ZERO)
            .with_failure_rate(1.0)
    }

    async fn run_effect(effect: Effect<IdentityAction>) -> Option<IdentityAction> {
        match effect {
            Effect::Future(fut) => fut.await,
            other => unreachable!("expected a future effect, got {other:?}"),
        }
    }

    #[test]
    fn load_marks_requested_and_returns_fetch() {
        ReducerTest::new(IdentityReducer::new())
            .with_env(env_with(always_succeeds()))
            .given_state(IdentityState::new())
            .when_action(IdentityAction::Load)
            .then_state(|state| {
                assert!(state.is_requested());
                assert!(state.is_loading());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn second_load_is_ignored() {
        ReducerTest::new(IdentityReducer::new())
            .with_env(env_with(always_succeeds()))
            .given_state(IdentityState::new())
            .when_actions([IdentityAction::Load, IdentityAction::Load])
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn success_resolves_verified() {
        let env = env_with(always_succeeds());
        let mut state = IdentityState::new();
        let mut effects = IdentityReducer::new().reduce(&mut state, IdentityAction::Load, &env);

        let action = run_effect(effects.remove(0)).await.unwrap();
        IdentityReducer::new().reduce(&mut state, action, &env);

        assert_eq!(
            state.outcome(),
            Some(&IdentityOutcome::Verified(Identity::verified("Demo User", 123)))
        );
        assert!(state.identity().unwrap().verified);
    }

    #[tokio::test]
    async fn failure_resolves_guest() {
        let env = env_with(always_fails());
        let mut state = IdentityState::new();
        let mut effects = IdentityReducer::new().reduce(&mut state, IdentityAction::Load, &env);

        let action = run_effect(effects.remove(0)).await.unwrap();
        IdentityReducer::new().reduce(&mut state, action, &env);

        let outcome = state.outcome().unwrap();
        assert!(outcome.is_fallback());
        assert_eq!(outcome.identity(), &Identity::guest());
        assert!(!outcome.identity().verified);
    }

    #[test]
    fn resolved_is_terminal() {
        let first = IdentityOutcome::Verified(Identity::verified("Demo User", 123));
        let expected = first.clone();

        ReducerTest::new(IdentityReducer::new())
            .with_env(env_with(always_succeeds()))
            .given_state(IdentityState::new())
            .when_action(IdentityAction::Resolved { outcome: first })
            .when_action(IdentityAction::Resolved {
                outcome: IdentityOutcome::Fallback(Identity::guest()),
            })
            .when_action(IdentityAction::Load)
            .then_state(move |state| assert_eq!(state.outcome(), Some(&expected)))
            .run();
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_service_waits_for_latency() {
        let service = SimulatedIdentityService::new()
            .with_latency(Duration::from_millis(500))
            .with_failure_rate(0.0);

        let start = tokio::time::Instant::now();
        let identity = service.fetch().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(identity.name, "Demo User");
    }

    #[tokio::test]
    async fn both_outcomes_are_reachable_at_default_rate() {
        let service = SimulatedIdentityService::new()
            .with_latency(Duration::ZERO)
            .with_seed(11);

        let mut failures = 0;
        for _ in 0..200 {
            if service.fetch().await.is_err() {
                failures += 1;
            }
        }

        // Around one lookup in ten falls back
        assert!(failures > 0, "no lookup failed");
        assert!(failures < 60, "{failures} of 200 lookups failed");
    }

    #[test]
    fn failure_rate_is_clamped() {
        assert!(SimulatedIdentityService::new().with_failure_rate(4.0).roll_failure());
        assert!(!SimulatedIdentityService::new().with_failure_rate(-1.0).roll_failure());
        assert!(!SimulatedIdentityService::new().with_failure_rate(f64::NAN).roll_failure());
    }
}
