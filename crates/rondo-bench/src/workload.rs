//! Deterministic random busy-work between barrier episodes.
//!
//! Each worker gets its own seeded generator so that every trial of a cell
//! replays the identical workload sequence — a requirement for reproducible
//! latency numbers. The busy loop is bounded by the workload parameter and
//! kept alive with `black_box`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rondo_error::{Result, RondoError};

/// A seeded busy-loop generator drawing lengths from `[1, workload]`.
pub struct RandomWorkload {
    bound: u64,
    rng: StdRng,
}

impl RandomWorkload {
    /// A workload generator with the given upper bound and seed.
    ///
    /// # Errors
    ///
    /// [`RondoError::ZeroWorkload`] when `workload` is 0 (the draw range
    /// would be empty).
    pub fn new(workload: u64, seed: u64) -> Result<Self> {
        if workload == 0 {
            return Err(RondoError::ZeroWorkload);
        }
        Ok(Self {
            bound: workload,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Spin for a random number of iterations in `[1, workload]`.
    #[inline]
    pub fn run(&mut self) {
        let iterations = self.rng.gen_range(1..=self.bound);
        for i in 0..iterations {
            std::hint::black_box(i);
        }
    }

    /// Draw the next loop length without spinning (test hook).
    #[cfg(test)]
    fn next_length(&mut self) -> u64 {
        self.rng.gen_range(1..=self.bound)
    }
}

impl std::fmt::Debug for RandomWorkload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomWorkload")
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}
