//! Read models for the presentation layer.

use crate::identity::IdentityState;
use crate::types::{DebugInfo, Filter, TodoCounts, TodoItem, TodoState};
use serde::Serialize;

/// Page heading for the current identity state
#[must_use]
pub fn heading(identity: &IdentityState) -> String {
    match identity.identity() {
        Some(identity) => format!("{}'s Todo App", identity.name),
        None => "Loading... Todo App".to_string(),
    }
}

/// Placeholder shown when the filtered list is empty
#[must_use]
pub const fn empty_message(filter: Filter) -> &'static str {
    match filter {
        Filter::All => "No todos yet!",
        Filter::Active => "No active todos!",
        Filter::Completed => "No completed todos!",
    }
}

/// Window title mirroring the item count
#[must_use]
pub fn window_title(total: usize) -> String {
    format!("Todo App ({total} items)")
}

/// Everything needed to render one frame of the list
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TodoView {
    /// Page heading
    pub heading: String,
    /// Window title
    pub title: String,
    /// Selected filter
    pub filter: Filter,
    /// Items visible under the filter, in list order
    pub items: Vec<TodoItem>,
    /// Shown instead of the items when none are visible
    pub empty_message: Option<&'static str>,
    /// Item counts over the whole list
    pub counts: TodoCounts,
    /// Debug panel
    pub debug: DebugInfo,
}

impl TodoView {
    /// Combine both snapshots into one read model
    #[must_use]
    pub fn build(todos: &TodoState, identity: &IdentityState) -> Self {
        let items: Vec<TodoItem> = todos.filtered_view().into_iter().cloned().collect();
        let empty_message = items.is_empty().then(|| empty_message(todos.filter()));

        Self {
            heading: heading(identity),
            title: window_title(todos.len()),
            filter: todos.filter(),
            items,
            empty_message,
            counts: todos.counts(),
            debug: todos.debug_info(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{
        Identity, IdentityAction, IdentityEnvironment, IdentityOutcome, IdentityReducer,
        SimulatedIdentityService,
    };
    use crate::priority::FixedPriority;
    use crate::reducer::{TodoEnvironment, TodoReducer};
    use crate::types::{Priority, TodoAction};
    use std::sync::Arc;
    use tasklist_core::reducer::Reducer;
    use tasklist_testing::test_clock;

    fn resolved(outcome: IdentityOutcome) -> IdentityState {
        let env = IdentityEnvironment::new(Arc::new(SimulatedIdentityService::new()));
        let mut state = IdentityState::new();
        IdentityReducer::new().reduce(&mut state, IdentityAction::Resolved { outcome }, &env);
        state
    }

    #[test]
    fn heading_follows_identity() {
        assert_eq!(heading(&IdentityState::new()), "Loading... Todo App");
        assert_eq!(
            heading(&resolved(IdentityOutcome::Verified(Identity::verified("Demo User", 123)))),
            "Demo User's Todo App"
        );
        assert_eq!(
            heading(&resolved(IdentityOutcome::Fallback(Identity::guest()))),
            "Guest User's Todo App"
        );
    }

    #[test]
    fn empty_messages_per_filter() {
        assert_eq!(empty_message(Filter::All), "No todos yet!");
        assert_eq!(empty_message(Filter::Active), "No active todos!");
        assert_eq!(empty_message(Filter::Completed), "No completed todos!");
    }

    #[test]
    fn title_counts_items() {
        assert_eq!(window_title(0), "Todo App (0 items)");
        assert_eq!(window_title(3), "Todo App (3 items)");
    }

    #[test]
    fn view_combines_snapshots() {
        let env = TodoEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(FixedPriority(Priority::Low)),
        );
        let reducer = TodoReducer::new();
        let mut todos = TodoState::new();

        let view = TodoView::build(&todos, &IdentityState::new());
        assert_eq!(view.empty_message, Some("No todos yet!"));
        assert_eq!(view.heading, "Loading... Todo App");

        for text in ["a", "b"] {
            reducer.reduce(&mut todos, TodoAction::Add { text: text.to_string() }, &env);
        }
        let id = todos.items()[0].id;
        reducer.reduce(&mut todos, TodoAction::Toggle { id }, &env);
        reducer.reduce(&mut todos, TodoAction::SetFilter { filter: Filter::Completed }, &env);

        let identity = resolved(IdentityOutcome::Verified(Identity::verified("Demo User", 123)));
        let view = TodoView::build(&todos, &identity);

        assert_eq!(view.heading, "Demo User's Todo App");
        assert_eq!(view.title, "Todo App (2 items)");
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].id, id);
        assert_eq!(view.empty_message, None);
        assert_eq!(view.counts, TodoCounts { total: 2, active: 1, completed: 1 });
        assert_eq!(view.debug.filtered, 1);
        assert_eq!(view.debug.add_attempts, 2);
    }
}
