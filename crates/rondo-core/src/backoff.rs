//! Spin primitives: a short architectural pause and an adaptive backoff.
//!
//! [`pause`] issues a handful of pause hints — nearly free, but it relaxes
//! execution-resource contention with a hyperthread sibling while we wait on
//! a line another core owns. [`Backoff`] escalates from a few pauses to
//! yielding the CPU once a spin has gone on long enough that the scheduler
//! probably needs to run whoever we are waiting for.

/// Execute `k` architectural pause hints.
#[inline]
pub fn pause(k: usize) {
    for _ in 0..k {
        std::hint::spin_loop();
    }
}

/// Spin budget before a backoff starts yielding the CPU.
const MAX_TRIES: usize = 16;

/// Pause count used by the constant strategy on every miss.
const CONSTANT_DELAY: usize = 16;

/// How a [`Backoff`] spends its spin budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Pure retry: no pause between attempts.
    None,
    /// A fixed 16 pauses per miss, independent of the failure count.
    Constant,
    /// Pause as many times as the current failure count, doubling each miss.
    #[default]
    Exponential,
}

/// Per-caller adaptive backoff.
///
/// Each [`snooze`](Backoff::snooze) either spins briefly (per the strategy)
/// and doubles the internal try counter, or — once the counter has exceeded
/// the cap of 16 — yields the CPU. [`reset`](Backoff::reset) returns the
/// counter to 1 and should be called after the first successful observation
/// so the next episode starts on the fast path.
#[derive(Debug)]
pub struct Backoff {
    strategy: BackoffStrategy,
    tries: usize,
}

impl Backoff {
    /// A backoff using the given strategy, with its try counter at 1.
    #[must_use]
    pub const fn new(strategy: BackoffStrategy) -> Self {
        Self { strategy, tries: 1 }
    }

    /// Back off once: spin while under the cap, yield above it.
    #[inline]
    pub fn snooze(&mut self) {
        if self.tries <= MAX_TRIES {
            match self.strategy {
                BackoffStrategy::None => {}
                BackoffStrategy::Constant => pause(CONSTANT_DELAY),
                BackoffStrategy::Exponential => pause(self.tries),
            }
            self.tries = self.tries.saturating_mul(2);
        } else {
            std::thread::yield_now();
        }
    }

    /// Return the try counter to 1. Call after a successful observation.
    #[inline]
    pub fn reset(&mut self) {
        self.tries = 1;
    }

    /// Whether the next [`snooze`](Backoff::snooze) would yield the CPU
    /// instead of spinning.
    #[inline]
    #[must_use]
    pub fn is_yielding(&self) -> bool {
        self.tries > MAX_TRIES
    }
}

impl Default for Backoff {
    /// Exponential backoff, the default policy.
    fn default() -> Self {
        Self::new(BackoffStrategy::Exponential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_is_callable_with_any_count() {
        pause(0);
        pause(1);
        pause(64);
    }

    #[test]
    fn exponential_reaches_yield_after_five_misses() {
        // tries: 1 -> 2 -> 4 -> 8 -> 16 -> 32; the sixth snooze yields.
        let mut backoff = Backoff::default();
        for _ in 0..5 {
            assert!(!backoff.is_yielding());
            backoff.snooze();
        }
        assert!(backoff.is_yielding());
        backoff.snooze();
        assert!(backoff.is_yielding());
    }

    #[test]
    fn reset_restores_the_fast_path() {
        let mut backoff = Backoff::default();
        for _ in 0..8 {
            backoff.snooze();
        }
        assert!(backoff.is_yielding());
        backoff.reset();
        assert!(!backoff.is_yielding());
    }

    #[test]
    fn all_strategies_share_the_cap() {
        for strategy in [
            BackoffStrategy::None,
            BackoffStrategy::Constant,
            BackoffStrategy::Exponential,
        ] {
            let mut backoff = Backoff::new(strategy);
            for _ in 0..5 {
                backoff.snooze();
            }
            assert!(backoff.is_yielding(), "{strategy:?} must cap at 16 tries");
        }
    }

    #[test]
    fn default_strategy_is_exponential() {
        assert_eq!(BackoffStrategy::default(), BackoffStrategy::Exponential);
    }
}
