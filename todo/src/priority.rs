//! Priority assignment policies.
//!
//! Production lists pick a priority at random so both display states show up;
//! tests inject one of the deterministic policies instead.

use crate::types::Priority;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Decides the priority of a newly created item
pub trait PriorityPolicy: Send + Sync {
    /// Priority for the item with this text and sequence number
    fn assign(&self, text: &str, sequence_number: u64) -> Priority;
}

/// Coin flip between [`Priority::High`] and [`Priority::Low`]
#[derive(Debug)]
pub struct RandomPriority {
    rng: Mutex<StdRng>,
}

impl RandomPriority {
    /// Seeded from the operating system
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of priorities
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPriority {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityPolicy for RandomPriority {
    fn assign(&self, _text: &str, _sequence_number: u64) -> Priority {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.gen_bool(0.5) {
            Priority::High
        } else {
            Priority::Low
        }
    }
}

/// Always the same priority
#[derive(Debug, Clone, Copy)]
pub struct FixedPriority(pub Priority);

impl PriorityPolicy for FixedPriority {
    fn assign(&self, _text: &str, _sequence_number: u64) -> Priority {
        self.0
    }
}

/// High for odd sequence numbers, low for even ones
#[derive(Debug, Clone, Copy, Default)]
pub struct AlternatingPriority;

impl PriorityPolicy for AlternatingPriority {
    fn assign(&self, _text: &str, sequence_number: u64) -> Priority {
        if sequence_number % 2 == 1 {
            Priority::High
        } else {
            Priority::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_policy_produces_both_values() {
        let policy = RandomPriority::new();
        let picks: Vec<_> = (1..=200).map(|n| policy.assign("x", n)).collect();

        assert!(picks.contains(&Priority::High));
        assert!(picks.contains(&Priority::Low));
    }

    #[test]
    fn seeded_policy_is_reproducible() {
        let a = RandomPriority::with_seed(7);
        let b = RandomPriority::with_seed(7);

        for n in 1..=32 {
            assert_eq!(a.assign("x", n), b.assign("x", n));
        }
    }

    #[test]
    fn deterministic_policies() {
        assert_eq!(FixedPriority(Priority::Low).assign("x", 1), Priority::Low);
        assert_eq!(AlternatingPriority.assign("x", 1), Priority::High);
        assert_eq!(AlternatingPriority.assign("x", 2), Priority::Low);
    }
}
