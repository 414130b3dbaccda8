//! Centralized sense-reversing barrier.
//!
//! One shared counter and one shared sense flag, each on its own cache line.
//! Arrivals decrement the counter; the last arriver rearms it and flips the
//! sense, releasing every spinner at once. Participants recognize release by
//! comparing the shared sense against a private copy that they flip on every
//! episode, so nothing ever needs to be reset.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rondo_error::{Result, RondoError};

use crate::backoff::Backoff;
use crate::cache_aligned::CacheAligned;

/// Returned by every barrier wait; exactly one participant per episode is
/// the leader (the last arriver for the centralized barrier, the tree root
/// for the tree variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitResult {
    is_leader: bool,
}

impl WaitResult {
    pub(crate) const fn new(is_leader: bool) -> Self {
        Self { is_leader }
    }

    /// Whether this participant was the one that released the episode.
    #[must_use]
    pub const fn is_leader(&self) -> bool {
        self.is_leader
    }
}

struct Shared {
    count: CacheAligned<AtomicUsize>,
    sense: CacheAligned<AtomicBool>,
    fanout: usize,
}

/// A participant handle on a centralized sense-reversing barrier.
///
/// [`new`](CentralizedBarrier::new) creates the barrier together with its
/// first handle; clone the handle once per additional participant *before*
/// the first [`wait`](CentralizedBarrier::wait). Each handle carries the
/// caller-private sense, so `wait` takes `&mut self`.
pub struct CentralizedBarrier {
    shared: Arc<Shared>,
    local_sense: bool,
    used: bool,
}

impl CentralizedBarrier {
    /// Create a barrier expecting `fanout` participants.
    ///
    /// # Errors
    ///
    /// [`RondoError::ZeroFanout`] if `fanout` is 0.
    pub fn new(fanout: usize) -> Result<Self> {
        if fanout == 0 {
            return Err(RondoError::ZeroFanout);
        }
        Ok(Self {
            shared: Arc::new(Shared {
                count: CacheAligned::new(AtomicUsize::new(fanout)),
                sense: CacheAligned::new(AtomicBool::new(true)),
                fanout,
            }),
            // Complement of the shared sense; flipped on the way out of wait.
            local_sense: false,
            used: false,
        })
    }

    /// Number of participants this barrier expects per episode.
    #[must_use]
    pub fn fanout(&self) -> usize {
        self.shared.fanout
    }

    /// This participant's private sense value. Flips once per completed
    /// episode; starts `false`.
    #[must_use]
    pub fn local_sense(&self) -> bool {
        self.local_sense
    }

    /// Block until all participants of this episode have arrived.
    ///
    /// The release target is the *current* local sense — the complement of
    /// the shared sense while the episode is in flight — and the private
    /// flip happens on the way out, exactly as in the tree variants.
    ///
    /// The counter decrement is acquire-release, so the last arriver
    /// observes every peer's pre-arrival writes; the sense store is release
    /// and the final spin load acquire, so every released participant
    /// observes them too. The counter is rearmed with a plain store before
    /// the sense flips — no thread can reach its next decrement until the
    /// flip publishes it.
    pub fn wait(&mut self) -> WaitResult {
        self.used = true;

        let is_leader = if self.shared.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.count.store(self.shared.fanout, Ordering::Relaxed);
            self.shared.sense.store(self.local_sense, Ordering::Release);
            true
        } else {
            let mut backoff = Backoff::default();
            while self.shared.sense.load(Ordering::Relaxed) != self.local_sense {
                backoff.snooze();
            }
            self.shared.sense.load(Ordering::Acquire);
            false
        };

        self.local_sense = !self.local_sense;
        WaitResult::new(is_leader)
    }
}

impl Clone for CentralizedBarrier {
    /// Create another participant handle. Must happen before the source
    /// handle's first [`wait`](CentralizedBarrier::wait), while all senses
    /// still agree.
    fn clone(&self) -> Self {
        assert!(
            !self.used,
            "centralized barrier handles must be cloned before the first wait"
        );
        Self {
            shared: Arc::clone(&self.shared),
            local_sense: self.local_sense,
            used: false,
        }
    }
}

impl std::fmt::Debug for CentralizedBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CentralizedBarrier")
            .field("fanout", &self.shared.fanout)
            .field("count", &self.shared.count.load(Ordering::Relaxed))
            .field("sense", &self.shared.sense.load(Ordering::Relaxed))
            .field("local_sense", &self.local_sense)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn zero_fanout_is_rejected() {
        assert!(matches!(
            CentralizedBarrier::new(0),
            Err(RondoError::ZeroFanout)
        ));
    }

    #[test]
    fn single_participant_returns_immediately() {
        let mut barrier = CentralizedBarrier::new(1).unwrap();
        assert!(!barrier.local_sense());
        let result = barrier.wait();
        assert!(result.is_leader());
        // Counter is rearmed; shared and private senses toggled exactly once.
        assert_eq!(barrier.shared.count.load(Ordering::Relaxed), 1);
        assert!(!barrier.shared.sense.load(Ordering::Relaxed));
        assert!(barrier.local_sense());
    }

    #[test]
    fn exactly_one_leader_per_episode() {
        const N: usize = 4;
        const EPISODES: usize = 100;

        let barrier = CentralizedBarrier::new(N).unwrap();
        let mut participants: Vec<_> = (0..N - 1).map(|_| barrier.clone()).collect();
        participants.push(barrier);

        let handles: Vec<_> = participants
            .into_iter()
            .map(|mut b| {
                thread::spawn(move || (0..EPISODES).filter(|_| b.wait().is_leader()).count())
            })
            .collect();

        let leaders: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(leaders, EPISODES, "one leader per episode, no more");
    }

    #[test]
    fn sense_parity_after_many_episodes() {
        const N: usize = 2;
        const EPISODES: usize = 101;

        let barrier = CentralizedBarrier::new(N).unwrap();
        let mut other = barrier.clone();
        let mut me = barrier;

        let peer = thread::spawn(move || {
            for _ in 0..EPISODES {
                other.wait();
            }
            other.local_sense()
        });
        for _ in 0..EPISODES {
            me.wait();
        }

        // Initial sense false, odd episode count: both end at true.
        assert!(me.local_sense());
        assert!(peer.join().unwrap());
    }

    #[test]
    #[should_panic(expected = "cloned before the first wait")]
    fn clone_after_wait_panics() {
        let mut barrier = CentralizedBarrier::new(1).unwrap();
        barrier.wait();
        let _ = barrier.clone();
    }
}
