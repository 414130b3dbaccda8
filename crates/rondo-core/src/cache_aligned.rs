//! Cache-line-aware storage for independently contended atomics.
//!
//! Barrier latency at small thread counts is dominated by cache-coherence
//! traffic: two unrelated atomics sharing one line turn every store into an
//! invalidation of the other's reader. Every shared field in this crate is
//! therefore wrapped so it owns its line outright.
//!
//! # Cache-Line Size
//!
//! We assume 64-byte cache lines (standard on x86-64 and AArch64), encoded
//! in [`CACHE_LINE_BYTES`]. Over-aligning on platforms with larger lines
//! wastes a little memory and nothing else.

use std::sync::atomic::{AtomicBool, Ordering};

/// Cache line size in bytes.
pub const CACHE_LINE_BYTES: usize = 64;

// ---------------------------------------------------------------------------
// CacheAligned<T>
// ---------------------------------------------------------------------------

/// Wraps a value so it starts on a cache-line boundary.
///
/// `#[repr(C, align(64))]` guarantees the address is 64-byte aligned and the
/// total size is rounded up to a whole multiple of 64 bytes, so adjacent
/// elements in an array can never share a line.
#[repr(C, align(64))]
pub struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    /// Wrap `value` with cache-line alignment.
    #[inline]
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Unwrap, returning the inner value.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Default> Default for CacheAligned<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> std::ops::DerefMut for CacheAligned<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for CacheAligned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// SharedFlag
// ---------------------------------------------------------------------------

/// A single atomic boolean padded to one full cache line.
///
/// This is the slot a tree-barrier child toggles to announce its subtree's
/// arrival. Slots are identified by position in their owning node and are
/// never copied; each one gets its own line so siblings notifying the same
/// parent do not contend with each other.
///
/// Initialized to `true`, matching the rest-state sense of a fresh barrier.
#[repr(C, align(64))]
pub struct SharedFlag {
    flag: AtomicBool,
}

impl SharedFlag {
    /// A fresh slot holding `true`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(true),
        }
    }

    /// Read the slot.
    #[inline]
    pub fn load(&self, ordering: Ordering) -> bool {
        self.flag.load(ordering)
    }

    /// Write the slot.
    #[inline]
    pub fn store(&self, value: bool, ordering: Ordering) {
        self.flag.store(value, ordering);
    }
}

impl Default for SharedFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFlag")
            .field("flag", &self.flag.load(Ordering::Relaxed))
            .finish()
    }
}
