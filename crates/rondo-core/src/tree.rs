//! Static tree barrier with separate arrival and departure trees.
//!
//! Each participant owns one cache-aligned node. Children announce arrival
//! by toggling a dedicated, cache-line-padded slot in their parent's node;
//! the root learns of completion once its whole subtree has reported, then
//! the release cascades back down through each node's `sense` flag.
//!
//! The slots are never reset: a child writes its *own* local sense into the
//! parent's slot, and because parent and child advance their local senses in
//! lockstep each episode, equality with the parent's current sense always
//! means "arrived this episode". This halves the stores on the critical
//! path compared with the textbook formulation.
//!
//! Sibling references are rendered as `(node index, slot index)` pairs into
//! one shared node slice. The slice sits behind an `Arc` and is never
//! resized, so slot addresses stay pinned for the barrier's lifetime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rondo_error::Result;

use crate::backoff::Backoff;
use crate::cache_aligned::{CacheAligned, SharedFlag};
use crate::centralized::WaitResult;
use crate::topology::{Locality, ParentLink, Topology};

// Alignment comes from the leading `CacheAligned` field; a whole node owns
// its lines, so a hardware prefetcher pulling a neighbor costs nothing.
struct TreeNode {
    /// Where my parent signals my departure.
    sense: CacheAligned<AtomicBool>,
    /// One padded slot per arrival child.
    arrival_children: Box<[SharedFlag]>,
    /// The slot where I announce my subtree's arrival; `None` for the root.
    arrival_parent: Option<ParentLink>,
    /// Whom I release, in slot order (the arrival tree reversed).
    departure_children: Box<[usize]>,
}

/// The shared node storage of a local-departure tree barrier.
///
/// Built once per session by [`with_layout`](TreeBarrier::with_layout); the
/// waiters hold the only references, so dropping the last waiter frees the
/// nodes.
pub struct TreeBarrier {
    nodes: Box<[TreeNode]>,
}

impl TreeBarrier {
    /// Build nodes wired per the shape table for `participants` and hand
    /// out one waiter per logical participant id.
    ///
    /// # Errors
    ///
    /// [`rondo_error::RondoError::ZeroFanout`] or
    /// [`rondo_error::RondoError::UnsupportedFanout`] from the shape lookup.
    pub fn with_layout(participants: usize, locality: Locality) -> Result<Vec<TreeWaiter>> {
        let topology = Topology::for_participants(participants, locality)?;
        let nodes: Box<[TreeNode]> = (0..participants)
            .map(|i| TreeNode {
                sense: CacheAligned::new(AtomicBool::new(true)),
                arrival_children: (0..topology.child_count(i)).map(|_| SharedFlag::new()).collect(),
                arrival_parent: topology.parent(i),
                departure_children: topology.departure_children(i).into_boxed_slice(),
            })
            .collect();

        let shared = Arc::new(Self { nodes });
        Ok((0..participants)
            .map(|index| TreeWaiter {
                shared: Arc::clone(&shared),
                index,
                local_sense: false,
            })
            .collect())
    }
}

/// A participant's handle on a [`TreeBarrier`], bound to one node.
///
/// Carries the caller-private sense; `wait` takes `&mut self` and touches
/// other nodes only through the arrival-parent and departure-children links
/// fixed at construction.
pub struct TreeWaiter {
    shared: Arc<TreeBarrier>,
    index: usize,
    local_sense: bool,
}

impl TreeWaiter {
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
    /// Arrival: spin each child slot (relaxed) up to the current local
    /// sense, then one acquire load to fence the child's writes. If not the
    /// root, release-store the local sense into the parent's slot and spin
    /// on this node's own `sense` the same way. Departure: release-store
    /// the local sense into each child's `sense`. Finally flip.
    pub fn wait(&mut self) -> WaitResult {
        let nodes = &self.shared.nodes;
        let node = &nodes[self.index];
        let mut backoff = Backoff::default();

        for slot in node.arrival_children.iter() {
            while slot.load(Ordering::Relaxed) != self.local_sense {
                backoff.snooze();
            }
            backoff.reset();
            slot.load(Ordering::Acquire);
        }

        if let Some(link) = node.arrival_parent {
            nodes[link.parent].arrival_children[link.slot]
                .store(self.local_sense, Ordering::Release);

            while node.sense.load(Ordering::Relaxed) != self.local_sense {
                backoff.snooze();
            }
            backoff.reset();
            node.sense.load(Ordering::Acquire);
        }

        for &child in node.departure_children.iter() {
            nodes[child].sense.store(self.local_sense, Ordering::Release);
        }

        self.local_sense = !self.local_sense;
        WaitResult::new(node.arrival_parent.is_none())
    }
}

impl std::fmt::Debug for TreeWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeWaiter")
            .field("participant", &self.index)
            .field("local_sense", &self.local_sense)
            .field("is_root", &self.is_root())
            .finish()
    }
}
