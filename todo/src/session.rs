//! One user session: a todo list next to the identity loader.
//!
//! The two stores are independent. Todo commands are processed while the
//! identity lookup is still in flight.

use crate::config::SessionConfig;
use crate::identity::{
    IdentityAction, IdentityEnvironment, IdentityOutcome, IdentityReducer, IdentityState,
    SimulatedIdentityService,
};
use crate::priority::RandomPriority;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{Filter, TodoAction, TodoId, TodoState};
use crate::view::TodoView;
use std::sync::Arc;
use std::time::Duration;
use tasklist_core::environment::SystemClock;
use tasklist_runtime::{EffectHandle, Store, StoreConfig, StoreError};
use tokio::sync::broadcast;

/// Store running the todo list
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Store running the identity loader
pub type IdentityStore =
    Store<IdentityState, IdentityAction, IdentityEnvironment, IdentityReducer>;

/// A running session
#[derive(Clone)]
pub struct TodoSession {
    todos: TodoStore,
    identity: IdentityStore,
}

impl TodoSession {
    /// Start a session with the production environment
    ///
    /// Uses the system clock, random priorities and the simulated identity
    /// service, all tuned by `config`.
    ///
    /// # Errors
    ///
    /// Fails only if the identity store rejects the initial load.
    pub async fn start(config: &SessionConfig) -> Result<Self, StoreError> {
        let priority = config
            .seed
            .map_or_else(RandomPriority::new, RandomPriority::with_seed);

        let mut service = SimulatedIdentityService::new()
            .with_latency(config.identity_latency)
            .with_failure_rate(config.identity_failure_rate);
        if let Some(seed) = config.seed {
            service = service.with_seed(seed);
        }

        let todo_env = TodoEnvironment::new(Arc::new(SystemClock), Arc::new(priority));
        let identity_env = IdentityEnvironment::new(Arc::new(service));

        Self::start_with(config, todo_env, identity_env).await
    }

    /// Start a session with injected environments
    ///
    /// # Errors
    ///
    /// Fails only if the identity store rejects the initial load.
    pub async fn start_with(
        config: &SessionConfig,
        todo_env: TodoEnvironment,
        identity_env: IdentityEnvironment,
    ) -> Result<Self, StoreError> {
        let store_config =
            StoreConfig::default().with_broadcast_capacity(config.broadcast_capacity);

        let session = Self {
            todos: Store::with_config(
                TodoState::new(),
                TodoReducer::new(),
                todo_env,
                store_config.clone(),
            ),
            identity: Store::with_config(
                IdentityState::new(),
                IdentityReducer::new(),
                identity_env,
                store_config,
            ),
        };

        session.identity.send(IdentityAction::Load).await?;
        tracing::info!("Session started");

        Ok(session)
    }

    /// Add an item; blank text is ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown started.
    pub async fn add(&self, text: impl Into<String>) -> Result<EffectHandle, StoreError> {
        self.todos.send(TodoAction::Add { text: text.into() }).await
    }

    /// Flip completion of an item; unknown ids are ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown started.
    pub async fn toggle(&self, id: TodoId) -> Result<EffectHandle, StoreError> {
        self.todos.send(TodoAction::Toggle { id }).await
    }

    /// Remove an item; unknown ids are ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown started.
    pub async fn delete(&self, id: TodoId) -> Result<EffectHandle, StoreError> {
        self.todos.send(TodoAction::Delete { id }).await
    }

    /// Select the filter
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown started.
    pub async fn set_filter(&self, filter: Filter) -> Result<EffectHandle, StoreError> {
        self.todos.send(TodoAction::SetFilter { filter }).await
    }

    /// Current todo snapshot
    #[must_use]
    pub fn todos(&self) -> Arc<TodoState> {
        self.todos.snapshot()
    }

    /// Current identity snapshot
    #[must_use]
    pub fn identity(&self) -> Arc<IdentityState> {
        self.identity.snapshot()
    }

    /// Wait until the identity lookup has resolved
    ///
    /// Returns immediately if it already has.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the lookup is still pending after
    /// `timeout`.
    pub async fn wait_for_identity(
        &self,
        timeout: Duration,
    ) -> Result<IdentityOutcome, StoreError> {
        let mut rx = self.identity.subscribe();

        let snapshot = tokio::time::timeout(timeout, rx.wait_for(|state| state.is_resolved()))
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(|_| StoreError::ChannelClosed)?;

        snapshot.outcome().cloned().ok_or(StoreError::ChannelClosed)
    }

    /// Read model combining both snapshots
    #[must_use]
    pub fn view(&self) -> TodoView {
        TodoView::build(&self.todos(), &self.identity())
    }

    /// Notifications emitted by the todo list
    ///
    /// They arrive in the order the commands were dispatched.
    #[must_use]
    pub fn subscribe_todo_events(&self) -> broadcast::Receiver<TodoAction> {
        self.todos.subscribe_actions()
    }

    /// The underlying todo store
    #[must_use]
    pub const fn todo_store(&self) -> &TodoStore {
        &self.todos
    }

    /// The underlying identity store
    #[must_use]
    pub const fn identity_store(&self) -> &IdentityStore {
        &self.identity
    }

    /// Shut down both stores
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if either store still has
    /// effects running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        let (todos, identity) = tokio::join!(
            self.todos.shutdown(timeout),
            self.identity.shutdown(timeout)
        );
        todos.and(identity)
    }
}

/// Feed every `CountChanged` total to `on_total` until the store is dropped
///
/// A receiver that falls behind logs the gap and carries on with the oldest
/// notification still retained.
pub async fn follow_count_changes<F>(
    mut events: broadcast::Receiver<TodoAction>,
    mut on_total: F,
) where
    F: FnMut(usize),
{
    loop {
        match events.recv().await {
            Ok(TodoAction::CountChanged { total }) => on_total(total),
            Ok(_) => {},
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Count observer lagged");
            },
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

impl std::fmt::Debug for TodoSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoSession")
            .field("todos", &self.todos.snapshot().len())
            .field("identity_resolved", &self.identity.snapshot().is_resolved())
            .finish()
    }
}
