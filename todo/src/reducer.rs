//! Reducer logic for the todo list.
//!
//! Commands never fail: blank text and unknown ids are silently ignored.
//! Adds and deletes emit a [`TodoAction::CountChanged`] notification.

use crate::priority::PriorityPolicy;
use crate::types::{TodoAction, TodoState};
use std::sync::Arc;
use tasklist_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for creation and modification timestamps
    pub clock: Arc<dyn Clock>,
    /// Picks the priority of new items
    pub priority: Arc<dyn PriorityPolicy>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, priority: Arc<dyn PriorityPolicy>) -> Self {
        Self { clock, priority }
    }
}

impl std::fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for the todo list
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn count_changed(state: &TodoState) -> SmallVec<[Effect<TodoAction>; 4]> {
        smallvec![Effect::emit(TodoAction::CountChanged { total: state.len() })]
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodoAction::Add { text } => {
                state.record_add_attempt();

                if text.trim().is_empty() {
                    tracing::debug!("Ignoring blank todo text");
                    return smallvec![Effect::None];
                }

                let item = state.push_new(text, env.clock.now(), |text, sequence_number| {
                    env.priority.assign(text, sequence_number)
                });
                tracing::debug!(
                    id = %item.id,
                    sequence_number = item.sequence_number,
                    priority = %item.priority,
                    "Todo added"
                );

                Self::count_changed(state)
            },

            TodoAction::Toggle { id } => {
                match state.get_mut(id) {
                    Some(item) => {
                        item.toggle(env.clock.now());
                        tracing::debug!(%id, completed = item.completed, "Todo toggled");
                    },
                    None => tracing::debug!(%id, "Toggle for unknown todo ignored"),
                }
                smallvec![Effect::None]
            },

            TodoAction::Delete { id } => {
                if state.remove(id).is_some() {
                    tracing::debug!(%id, "Todo deleted");
                    Self::count_changed(state)
                } else {
                    tracing::debug!(%id, "Delete for unknown todo ignored");
                    smallvec![Effect::None]
                }
            },

            TodoAction::SetFilter { filter } => {
                state.set_filter(filter);
                smallvec![Effect::None]
            },

            // Broadcast by the store, never dispatched
            TodoAction::CountChanged { .. } => smallvec![Effect::None],
        }
    }
}
