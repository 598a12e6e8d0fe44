//! Fallback reply selection.
//!
//! The gateway picks a canned reply through [`ReplyPicker`] so callers can
//! swap the thread-local RNG for a seeded or fixed source.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, rng};

/// Chooses an index into a non-empty list of fallback replies.
pub trait ReplyPicker: Send + Sync {
    /// Return an index in `0..len`. `len` is always at least 1.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform selection from the thread-local RNG. Not cryptographically secure.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl ReplyPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rng().random_range(0..len)
    }
}

/// Uniform selection from a seeded RNG; reproducible across runs.
#[derive(Debug)]
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ReplyPicker for SeededPicker {
    fn pick(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.random_range(0..len),
            Err(poisoned) => poisoned.into_inner().random_range(0..len),
        }
    }
}

/// Always returns the same index, clamped to the list length.
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl ReplyPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}
