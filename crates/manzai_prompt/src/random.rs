//! Injectable randomness for technique fallback.

use rand::{SeedableRng, rngs::StdRng};
use std::sync::Mutex;

/// Source of random selections.
pub trait RandomSource: Send + Sync {
    /// Choose up to `amount` distinct indices from `0..len`, in ascending
    /// order.
    fn choose_indices(&self, len: usize, amount: usize) -> Vec<usize>;
}

/// Thread-local entropy; the production source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn choose_indices(&self, len: usize, amount: usize) -> Vec<usize> {
        let mut rng = rand::thread_rng();
        sorted_sample(&mut rng, len, amount)
    }
}

/// Deterministic source for tests and reproducible runs.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a source from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn choose_indices(&self, len: usize, amount: usize) -> Vec<usize> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sorted_sample(&mut *rng, len, amount)
    }
}

fn sorted_sample<R: rand::Rng + ?Sized>(rng: &mut R, len: usize, amount: usize) -> Vec<usize> {
    let mut picked = rand::seq::index::sample(rng, len, amount.min(len)).into_vec();
    picked.sort_unstable();
    picked
}
