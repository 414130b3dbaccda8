//! Static tree barrier with a global departure flag.
//!
//! Arrival works exactly as in the local-departure variant; release is a
//! single broadcast: the root stores its local sense into one shared flag
//! and every other participant spins on it. That makes the release O(1)
//! stores from the root at the price of N readers contending on one line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rondo_error::Result;

use crate::backoff::Backoff;
use crate::cache_aligned::{CacheAligned, SharedFlag};
use crate::centralized::WaitResult;
use crate::topology::{Locality, ParentLink, Topology};

#[repr(align(64))]
struct GlobalTreeNode {
    arrival_children: Box<[SharedFlag]>,
    arrival_parent: Option<ParentLink>,
}

/// Arrival tree plus the single departure sense it broadcasts through.
pub struct GlobalTreeBarrier {
    nodes: Box<[GlobalTreeNode]>,
    sense: CacheAligned<AtomicBool>,
}

impl GlobalTreeBarrier {
    /// Build nodes per the shape table and hand out one waiter per logical
    /// participant id.
    ///
    /// # Errors
    ///
    /// [`rondo_error::RondoError::ZeroFanout`] or
    /// [`rondo_error::RondoError::UnsupportedFanout`] from the shape lookup.
    pub fn with_layout(participants: usize, locality: Locality) -> Result<Vec<GlobalTreeWaiter>> {
        let topology = Topology::for_participants(participants, locality)?;
        let nodes: Box<[GlobalTreeNode]> = (0..participants)
            .map(|i| GlobalTreeNode {
                arrival_children: (0..topology.child_count(i)).map(|_| SharedFlag::new()).collect(),
                arrival_parent: topology.parent(i),
            })
            .collect();

        let shared = Arc::new(Self {
            nodes,
            sense: CacheAligned::new(AtomicBool::new(true)),
        });
        Ok((0..participants)
            .map(|index| GlobalTreeWaiter {
                shared: Arc::clone(&shared),
                index,
                local_sense: false,
            })
            .collect())
    }
}

/// A participant's handle on a [`GlobalTreeBarrier`], bound to one node.
pub struct GlobalTreeWaiter {
    shared: Arc<GlobalTreeBarrier>,
    index: usize,
    local_sense: bool,
}

impl GlobalTreeWaiter {
    /// Logical participant id of this waiter (its node index).
    #[must_use]
    pub fn participant(&self) -> usize {
        self.index
    }

    /// This participant's private sense value; starts `false` and flips
    /// once per completed episode.
    #[must_use]
    pub fn local_sense(&self) -> bool {
        self.local_sense
    }

    /// Whether this waiter operates the root node.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.shared.nodes[self.index].arrival_parent.is_none()
    }

    /// Block until all participants of this episode have arrived.
    ///
    /// Arrival as in the local-departure variant. The root then
    /// release-stores its local sense into the global flag; everyone else
    /// spins on it (relaxed) and fences with one acquire load.
    pub fn wait(&mut self) -> WaitResult {
        let node = &self.shared.nodes[self.index];
        let mut backoff = Backoff::default();

        for slot in node.arrival_children.iter() {
            while slot.load(Ordering::Relaxed) != self.local_sense {
                backoff.snooze();
            }
            backoff.reset();
            slot.load(Ordering::Acquire);
        }

        let is_root = match node.arrival_parent {
            Some(link) => {
                self.shared.nodes[link.parent].arrival_children[link.slot]
                    .store(self.local_sense, Ordering::Release);

                while self.shared.sense.load(Ordering::Relaxed) != self.local_sense {
                    backoff.snooze();
                }
                self.shared.sense.load(Ordering::Acquire);
                false
            }
            None => {
                self.shared.sense.store(self.local_sense, Ordering::Release);
                true
            }
        };

        self.local_sense = !self.local_sense;
        WaitResult::new(is_root)
    }
}

impl std::fmt::Debug for GlobalTreeWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalTreeWaiter")
            .field("participant", &self.index)
            .field("local_sense", &self.local_sense)
            .field("is_root", &self.is_root())
            .finish()
    }
}
