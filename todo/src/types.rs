//! Domain types for the todo list.
//!
//! A todo list is an ordered sequence of items plus the filter currently
//! selected by the user. The state also owns the counters that hand out
//! ids and sequence numbers, so two lists never share them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a todo item
///
/// Derived from the creation time in milliseconds, bumped past the last id
/// handed out by the same list when two items land in the same millisecond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    /// Creates a `TodoId` from its raw value
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority assigned to an item when it is created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// High priority
    High,
    /// Low priority
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Low => f.write_str("low"),
        }
    }
}

/// View selector narrowing the displayed list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every item
    #[default]
    All,
    /// Items not yet completed
    Active,
    /// Completed items
    Completed,
}

impl Filter {
    /// All filters, in display order
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Lowercase name of the filter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Whether `item` is visible under this filter
    #[must_use]
    pub const fn matches(self, item: &TodoItem) -> bool {
        match self {
            Self::All => true,
            Self::Active => !item.completed,
            Self::Completed => item.completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known filter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}' (expected all, active or completed)")]
pub struct ParseFilterError(String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseFilterError(s.to_string())),
        }
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: TodoId,
    /// Text as entered; never blank
    pub text: String,
    /// Whether the todo is completed
    pub completed: bool,
    /// When the todo was created
    pub created_at: DateTime<Utc>,
    /// When completion was last toggled
    pub last_modified: Option<DateTime<Utc>>,
    /// Priority assigned at creation
    pub priority: Priority,
    /// Creation order within the list, starting at 1
    pub sequence_number: u64,
}

impl TodoItem {
    /// Creates a new, not yet completed item
    #[must_use]
    pub const fn new(
        id: TodoId,
        text: String,
        created_at: DateTime<Utc>,
        priority: Priority,
        sequence_number: u64,
    ) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at,
            last_modified: None,
            priority,
            sequence_number,
        }
    }

    /// Flips completion and records when it happened
    pub fn toggle(&mut self, at: DateTime<Utc>) {
        self.completed = !self.completed;
        self.last_modified = Some(at);
    }
}

/// Derived item counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCounts {
    /// Every item in the list
    pub total: usize,
    /// Items not yet completed
    pub active: usize,
    /// Completed items
    pub completed: usize,
}

/// Contents of the debug panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Add commands received, including rejected blank ones
    pub add_attempts: u64,
    /// Items in the list
    pub total: usize,
    /// Items visible under the current filter
    pub filtered: usize,
    /// Current filter
    pub filter: Filter,
}

/// State of one todo list
///
/// Every store dispatch produces a fresh `TodoState`; reads go through the
/// accessor methods so the counters can only move forward.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    items: Vec<TodoItem>,
    filter: Filter,
    created_total: u64,
    last_id: u64,
    add_attempts: u64,
}

impl TodoState {
    /// Creates a new empty list showing every item
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All items, in insertion order
    #[must_use]
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    /// Returns the number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns an item by id
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|t| t.id == id)
    }

    /// Checks if an item exists
    #[must_use]
    pub fn exists(&self, id: TodoId) -> bool {
        self.get(id).is_some()
    }

    /// The active filter
    #[must_use]
    pub const fn filter(&self) -> Filter {
        self.filter
    }

    /// Items ever created, including deleted ones
    #[must_use]
    pub const fn created_total(&self) -> u64 {
        self.created_total
    }

    /// Add commands received, including rejected blank ones
    #[must_use]
    pub const fn add_attempts(&self) -> u64 {
        self.add_attempts
    }

    /// Items visible under the active filter, in insertion order
    ///
    /// Computed on every call.
    #[must_use]
    pub fn filtered_view(&self) -> Vec<&TodoItem> {
        self.view_of(self.filter)
    }

    /// Items visible under `filter`, in insertion order
    #[must_use]
    pub fn view_of(&self, filter: Filter) -> Vec<&TodoItem> {
        self.items.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Total, active and completed counts
    #[must_use]
    pub fn counts(&self) -> TodoCounts {
        let completed = self.items.iter().filter(|t| t.completed).count();
        TodoCounts {
            total: self.items.len(),
            active: self.items.len() - completed,
            completed,
        }
    }

    /// Snapshot for the debug panel
    #[must_use]
    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            add_attempts: self.add_attempts,
            total: self.items.len(),
            filtered: self.filtered_view().len(),
            filter: self.filter,
        }
    }

    pub(crate) const fn record_add_attempt(&mut self) {
        self.add_attempts += 1;
    }

    /// Appends an item built from the next sequence number and a fresh id
    pub(crate) fn push_new(
        &mut self,
        text: String,
        created_at: DateTime<Utc>,
        priority: impl FnOnce(&str, u64) -> Priority,
    ) -> &TodoItem {
        let sequence_number = self.created_total + 1;
        let millis = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last_id + 1);

        self.created_total = sequence_number;
        self.last_id = id;

        let priority = priority(&text, sequence_number);
        let item = TodoItem::new(TodoId(id), text, created_at, priority, sequence_number);
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    pub(crate) fn get_mut(&mut self, id: TodoId) -> Option<&mut TodoItem> {
        self.items.iter_mut().find(|t| t.id == id)
    }

    /// Removes an item, keeping the order of the rest
    pub(crate) fn remove(&mut self, id: TodoId) -> Option<TodoItem> {
        let index = self.items.iter().position(|t| t.id == id)?;
        Some(self.items.remove(index))
    }

    pub(crate) const fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }
}

/// Actions accepted by the todo reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Append a todo; blank text is ignored
    Add {
        /// Raw text as typed
        text: String,
    },

    /// Command: Flip completion of a todo
    Toggle {
        /// Todo to toggle
        id: TodoId,
    },

    /// Command: Remove a todo
    Delete {
        /// Todo to delete
        id: TodoId,
    },

    /// Command: Select which items are shown
    SetFilter {
        /// New filter
        filter: Filter,
    },

    // ========== Notifications ==========
    /// Notification: the number of items changed
    ///
    /// Emitted after a successful add or delete so the presentation layer
    /// can mirror the total (e.g. into the window title).
    CountChanged {
        /// Items in the list after the change
        total: usize,
    },
}

impl TodoAction {
    /// Returns `true` for the command variants
    #[must_use]
    pub const fn is_command(&self) -> bool {
        !self.is_notification()
    }

    /// Returns `true` for the notification variants
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        matches!(self, Self::CountChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }

    #[test]
    fn todo_id_display() {
        assert_eq!(TodoId::from_raw(42).to_string(), "42");
    }

    #[test]
    fn filter_parses_case_insensitively() {
        assert_eq!("Active".parse::<Filter>(), Ok(Filter::Active));
        assert_eq!(" completed ".parse::<Filter>(), Ok(Filter::Completed));
        assert_eq!("all".parse::<Filter>(), Ok(Filter::All));
        assert!("done".parse::<Filter>().is_err());
    }

    #[test]
    fn filter_display_matches_parse() {
        for filter in Filter::ALL {
            assert_eq!(filter.to_string().parse::<Filter>(), Ok(filter));
        }
    }

    #[test]
    fn item_toggle_sets_last_modified() {
        let mut item = TodoItem::new(TodoId(1), "Test".into(), at(0), Priority::Low, 1);
        assert_eq!(item.last_modified, None);

        item.toggle(at(5));
        assert!(item.completed);
        assert_eq!(item.last_modified, Some(at(5)));

        item.toggle(at(9));
        assert!(!item.completed);
        assert_eq!(item.last_modified, Some(at(9)));
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut state = TodoState::new();
        let first = state.push_new("a".into(), at(100), |_, _| Priority::High).id;
        let second = state.push_new("b".into(), at(100), |_, _| Priority::High).id;

        assert_eq!(first.as_u64(), 100_000);
        assert_eq!(second.as_u64(), 100_001);
    }

    #[test]
    fn ids_never_go_backwards_with_the_clock() {
        let mut state = TodoState::new();
        let first = state.push_new("a".into(), at(100), |_, _| Priority::High).id;
        let second = state.push_new("b".into(), at(50), |_, _| Priority::High).id;
        assert!(second > first);
    }

    #[test]
    fn sequence_survives_removal() {
        let mut state = TodoState::new();
        let first = state.push_new("a".into(), at(1), |_, _| Priority::Low).id;
        state.remove(first);
        let next = state.push_new("b".into(), at(2), |_, _| Priority::Low);

        assert_eq!(next.sequence_number, 2);
        assert_eq!(state.created_total(), 2);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn counts_and_debug_info() {
        let mut state = TodoState::new();
        let id = state.push_new("a".into(), at(1), |_, _| Priority::Low).id;
        state.push_new("b".into(), at(2), |_, _| Priority::Low);
        if let Some(item) = state.get_mut(id) {
            item.toggle(at(3));
        }
        state.set_filter(Filter::Completed);
        state.record_add_attempt();

        assert_eq!(
            state.counts(),
            TodoCounts {
                total: 2,
                active: 1,
                completed: 1,
            }
        );
        assert_eq!(
            state.debug_info(),
            DebugInfo {
                add_attempts: 1,
                total: 2,
                filtered: 1,
                filter: Filter::Completed,
            }
        );
    }

    #[test]
    fn action_kinds() {
        assert!(TodoAction::Add { text: "x".into() }.is_command());
        assert!(TodoAction::CountChanged { total: 1 }.is_notification());
        assert!(!TodoAction::SetFilter { filter: Filter::All }.is_notification());
    }
}
