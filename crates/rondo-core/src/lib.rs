//! Reusable thread-rendezvous barriers for shared-memory multi-core systems.
//!
//! A barrier of fanout N blocks each caller until all N participants have
//! reached it, then releases them together; every barrier here rearms itself
//! after each episode and can be reused indefinitely. Three algorithms are
//! provided:
//!
//! - [`CentralizedBarrier`]: one shared counter plus a sense-reversing flag.
//! - [`TreeBarrier`]: per-participant nodes forming an arrival tree and a
//!   mirrored departure tree.
//! - [`GlobalTreeBarrier`]: the same arrival tree with release broadcast
//!   through a single shared flag.
//!
//! All shared state is cache-line padded ([`CacheAligned`], [`SharedFlag`])
//! and every spin loop waits through an adaptive [`Backoff`]. The wait path
//! performs no system calls and no heap allocation; the only OS interaction
//! is the backoff's yield once spinning has exceeded its cap.

pub mod backoff;
pub mod cache_aligned;
pub mod centralized;
pub mod global_tree;
pub mod topology;
pub mod tree;

pub use backoff::{pause, Backoff, BackoffStrategy};
pub use cache_aligned::{CacheAligned, SharedFlag, CACHE_LINE_BYTES};
pub use centralized::{CentralizedBarrier, WaitResult};
pub use global_tree::{GlobalTreeBarrier, GlobalTreeWaiter};
pub use topology::{Locality, ParentLink, Topology, MAX_TREE_PARTICIPANTS};
pub use tree::{TreeBarrier, TreeWaiter};
