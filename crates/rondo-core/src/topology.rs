//! Static tree shapes for the tree barriers.
//!
//! The trees for 1 to 8 participants are enumerated constants, encoded as
//! data (per-node parent links) so tests can introspect them. Two families
//! are provided: *good locality* keeps parents and children on cores that
//! share a last-level cache under the identity core mapping; *bad locality*
//! scrambles the assignment so arrival signals deliberately cross cache
//! boundaries. Both tree-barrier variants consume the same shapes — the
//! global-departure barrier simply ignores the mirrored departure edges.

use rondo_error::{Result, RondoError};

/// Largest participant count covered by the built-in shape tables.
pub const MAX_TREE_PARTICIPANTS: usize = 8;

/// Core-placement preference for a tree layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    /// Parents and children land on cores sharing a last-level cache.
    Good,
    /// Parent/child pairs deliberately straddle cache boundaries.
    Bad,
}

/// Where a node announces its subtree's arrival: a slot in the child-flag
/// sequence of exactly one other node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    /// Index of the parent node.
    pub parent: usize,
    /// Slot within the parent's child-flag sequence reserved for this node.
    pub slot: usize,
}

const fn link(parent: usize, slot: usize) -> Option<ParentLink> {
    Some(ParentLink { parent, slot })
}

/// Good-locality shapes, indexed by participant count minus one. Entry `i`
/// is node `i`'s parent link; the root has none.
const GOOD_SHAPES: [&[Option<ParentLink>]; MAX_TREE_PARTICIPANTS] = [
    &[None],
    &[None, link(0, 0)],
    &[None, link(0, 0), link(0, 1)],
    &[None, link(0, 0), link(0, 1), link(2, 0)],
    &[None, link(4, 0), link(0, 1), link(2, 0), link(0, 0)],
    &[None, link(4, 0), link(0, 1), link(2, 0), link(0, 0), link(4, 1)],
    &[
        None,
        link(4, 0),
        link(0, 1),
        link(2, 0),
        link(0, 0),
        link(4, 1),
        link(2, 1),
    ],
    &[
        None,
        link(4, 0),
        link(0, 1),
        link(2, 0),
        link(0, 0),
        link(4, 1),
        link(2, 1),
        link(3, 0),
    ],
];

/// Bad-locality shapes: same family, scrambled node-to-participant mapping.
const BAD_SHAPES: [&[Option<ParentLink>]; MAX_TREE_PARTICIPANTS] = [
    &[None],
    &[None, link(0, 0)],
    &[None, link(0, 0), link(0, 1)],
    &[None, link(2, 0), link(0, 1), link(0, 0)],
    &[None, link(2, 0), link(0, 1), link(0, 0), link(3, 0)],
    &[None, link(2, 0), link(0, 1), link(0, 0), link(3, 0), link(2, 1)],
    &[
        None,
        link(2, 0),
        link(0, 1),
        link(0, 0),
        link(3, 0),
        link(2, 1),
        link(4, 0),
    ],
    &[
        None,
        link(2, 0),
        link(0, 1),
        link(0, 0),
        link(3, 0),
        link(2, 1),
        link(4, 0),
        link(4, 1),
    ],
];

/// A static arrival-tree shape over `N` participants.
///
/// The departure tree of the local-departure barrier is this tree reversed;
/// [`departure_children`](Topology::departure_children) derives it directly
/// from the parent links, so the mirror property holds by construction.
#[derive(Debug, Clone, Copy)]
pub struct Topology {
    links: &'static [Option<ParentLink>],
}

impl Topology {
    /// Look up the shape for `participants` nodes with the given locality.
    ///
    /// # Errors
    ///
    /// [`RondoError::ZeroFanout`] for 0 participants,
    /// [`RondoError::UnsupportedFanout`] above [`MAX_TREE_PARTICIPANTS`].
    pub fn for_participants(participants: usize, locality: Locality) -> Result<Self> {
        if participants == 0 {
            return Err(RondoError::ZeroFanout);
        }
        if participants > MAX_TREE_PARTICIPANTS {
            return Err(RondoError::UnsupportedFanout {
                requested: participants,
                max: MAX_TREE_PARTICIPANTS,
            });
        }
        let links = match locality {
            Locality::Good => GOOD_SHAPES[participants - 1],
            Locality::Bad => BAD_SHAPES[participants - 1],
        };
        let topology = Self { links };
        debug_assert_eq!(topology.validate(), Ok(()));
        tracing::debug!(
            target: "rondo.topology",
            participants,
            ?locality,
            root = topology.root(),
            "tree shape selected"
        );
        Ok(topology)
    }

    /// Number of participants in this shape.
    #[must_use]
    pub fn participants(&self) -> usize {
        self.links.len()
    }

    /// Node `index`'s parent link, or `None` for the root.
    #[must_use]
    pub fn parent(&self, index: usize) -> Option<ParentLink> {
        self.links[index]
    }

    /// Index of the root node.
    #[must_use]
    pub fn root(&self) -> usize {
        self.links
            .iter()
            .position(Option::is_none)
            .expect("every shape table entry has a root")
    }

    /// Number of arrival-children slots node `index` owns.
    #[must_use]
    pub fn child_count(&self, index: usize) -> usize {
        self.links
            .iter()
            .flatten()
            .filter(|l| l.parent == index)
            .count()
    }

    /// Node `index`'s children in slot order — the nodes it releases in the
    /// local-departure variant.
    #[must_use]
    pub fn departure_children(&self, index: usize) -> Vec<usize> {
        let mut children: Vec<(usize, usize)> = self
            .links
            .iter()
            .enumerate()
            .filter_map(|(child, l)| {
                l.filter(|l| l.parent == index).map(|l| (l.slot, child))
            })
            .collect();
        children.sort_unstable();
        children.into_iter().map(|(_, child)| child).collect()
    }

    /// Check the structural invariants of this shape. Exposed so tests can
    /// audit the tables; construction debug-asserts it.
    ///
    /// # Errors
    ///
    /// A description of the first violated invariant.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let n = self.links.len();

        let roots = self.links.iter().filter(|l| l.is_none()).count();
        if roots != 1 {
            return Err(format!("expected exactly one root, found {roots}"));
        }

        let mut seen = Vec::with_capacity(n);
        for (index, entry) in self.links.iter().enumerate() {
            let Some(l) = entry else { continue };
            if l.parent >= n {
                return Err(format!("node {index} points at out-of-range parent {}", l.parent));
            }
            if l.parent == index {
                return Err(format!("node {index} is its own parent"));
            }
            if seen.contains(&(l.parent, l.slot)) {
                return Err(format!("slot ({}, {}) claimed twice", l.parent, l.slot));
            }
            seen.push((l.parent, l.slot));
        }

        // Slots per parent must be dense: 0..child_count.
        for parent in 0..n {
            let count = self.child_count(parent);
            if count > 2 {
                return Err(format!("node {parent} has fanin {count}, maximum is 2"));
            }
            for slot in 0..count {
                if !seen.contains(&(parent, slot)) {
                    return Err(format!("node {parent} is missing a child in slot {slot}"));
                }
            }
        }

        // Every node must reach the root in at most n-1 hops (no cycles).
        for start in 0..n {
            let mut index = start;
            let mut hops = 0;
            while let Some(l) = self.links[index] {
                index = l.parent;
                hops += 1;
                if hops >= n {
                    return Err(format!("node {start} never reaches the root"));
                }
            }
        }

        Ok(())
    }
}
