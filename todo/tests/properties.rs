//! Property tests for the todo reducer.

// Test code can use unwrap/expect/panic
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use proptest::prelude::*;
use std::sync::Arc;
use tasklist_core::reducer::Reducer;
use tasklist_testing::stepping_clock;
use tasklist_todo::{Filter, RandomPriority, TodoAction, TodoEnvironment, TodoReducer, TodoState};

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Toggle(usize),
    Delete(usize),
    SetFilter(Filter),
}

fn text() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), " {1,3}", "[a-z ]{1,8}"]
}

fn filter() -> impl Strategy<Value = Filter> {
    prop_oneof![Just(Filter::All), Just(Filter::Active), Just(Filter::Completed)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => text().prop_map(Op::Add),
        2 => any::<usize>().prop_map(Op::Toggle),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => filter().prop_map(Op::SetFilter),
    ]
}

fn env() -> TodoEnvironment {
    TodoEnvironment::new(Arc::new(stepping_clock()), Arc::new(RandomPriority::with_seed(3)))
}

/// Turn an index into an existing id, or an id that was never handed out
fn to_action(state: &TodoState, op: Op) -> TodoAction {
    let id_at = |index: usize| {
        if state.is_empty() {
            tasklist_todo::TodoId::from_raw(0)
        } else {
            state.items()[index % state.len()].id
        }
    };

    match op {
        Op::Add(text) => TodoAction::Add { text },
        Op::Toggle(index) => TodoAction::Toggle { id: id_at(index) },
        Op::Delete(index) => TodoAction::Delete { id: id_at(index) },
        Op::SetFilter(filter) => TodoAction::SetFilter { filter },
    }
}

proptest! {
    #[test]
    fn length_counts_non_blank_adds(texts in prop::collection::vec(text(), 0..40)) {
        let env = env();
        let mut state = TodoState::new();
        for text in &texts {
            TodoReducer::new().reduce(&mut state, TodoAction::Add { text: text.clone() }, &env);
        }

        let expected = texts.iter().filter(|t| !t.trim().is_empty()).count();
        prop_assert_eq!(state.len(), expected);
        prop_assert_eq!(state.add_attempts(), texts.len() as u64);
    }

    #[test]
    fn invariants_hold_over_any_run(ops in prop::collection::vec(op(), 0..60)) {
        let env = env();
        let reducer = TodoReducer::new();
        let mut state = TodoState::new();
        let mut seen_sequences = Vec::new();

        for op in ops {
            let action = to_action(&state, op);
            reducer.reduce(&mut state, action, &env);

            // Sequence numbers never repeat, even after deletes
            if let Some(last) = state.items().last() {
                if !seen_sequences.contains(&last.sequence_number) {
                    seen_sequences.push(last.sequence_number);
                }
            }
            let sequences: Vec<u64> = state.items().iter().map(|t| t.sequence_number).collect();
            prop_assert!(sequences.windows(2).all(|w| w[0] < w[1]));

            let mut ids: Vec<_> = state.items().iter().map(|t| t.id).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), state.len());

            prop_assert!(state.items().iter().all(|t| !t.text.trim().is_empty()));

            let counts = state.counts();
            prop_assert_eq!(counts.active + counts.completed, counts.total);
            prop_assert_eq!(state.view_of(Filter::Active).len(), counts.active);
            prop_assert_eq!(state.view_of(Filter::Completed).len(), counts.completed);
            prop_assert_eq!(state.view_of(Filter::All).len(), state.len());
        }

        prop_assert!(seen_sequences.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(state.created_total() >= state.len() as u64);
    }

    #[test]
    fn toggle_twice_restores_completion(
        seed_texts in prop::collection::vec("[a-z]{1,6}", 1..10),
        pick in any::<usize>(),
    ) {
        let env = env();
        let reducer = TodoReducer::new();
        let mut state = TodoState::new();
        for text in seed_texts {
            reducer.reduce(&mut state, TodoAction::Add { text }, &env);
        }
        let id = state.items()[pick % state.len()].id;
        let before = state.get(id).unwrap().clone();

        reducer.reduce(&mut state, TodoAction::Toggle { id }, &env);
        let once = state.get(id).unwrap().clone();
        reducer.reduce(&mut state, TodoAction::Toggle { id }, &env);
        let twice = state.get(id).unwrap().clone();

        prop_assert_eq!(once.completed, !before.completed);
        prop_assert_eq!(twice.completed, before.completed);
        prop_assert!(once.last_modified > before.last_modified);
        prop_assert!(twice.last_modified > once.last_modified);
        prop_assert_eq!(twice.text, before.text);
        prop_assert_eq!(twice.sequence_number, before.sequence_number);
    }

    #[test]
    fn delete_is_idempotent(
        seed_texts in prop::collection::vec("[a-z]{1,6}", 1..10),
        pick in any::<usize>(),
    ) {
        let env = env();
        let reducer = TodoReducer::new();
        let mut state = TodoState::new();
        for text in seed_texts {
            reducer.reduce(&mut state, TodoAction::Add { text }, &env);
        }
        let id = state.items()[pick % state.len()].id;

        reducer.reduce(&mut state, TodoAction::Delete { id }, &env);
        let once = state.clone();
        reducer.reduce(&mut state, TodoAction::Delete { id }, &env);

        prop_assert!(!state.exists(id));
        prop_assert_eq!(state, once);
    }
}
