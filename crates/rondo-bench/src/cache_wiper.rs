//! Cache eviction between trials.
//!
//! A warm cache inflates barrier throughput and hides the coherence cost
//! being measured, so every trial starts by streaming a buffer larger than
//! any last-level cache the target machines carry. Volatile accesses keep
//! the compiler from deleting the loop; `black_box` keeps it from deleting
//! the accumulated result.

use rondo_core::CACHE_LINE_BYTES;

/// Default wipe buffer: 64 MiB, comfortably above the aggregate last-level
/// cache of the measured machines.
pub const WIPE_BUFFER_BYTES: usize = 64 * 1024 * 1024;

/// Reusable scratch buffer for evicting caches before a measurement.
pub struct CacheWiper {
    buffer: Vec<u8>,
    pass: u8,
}

impl CacheWiper {
    /// A wiper with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(WIPE_BUFFER_BYTES)
    }

    /// A wiper streaming `bytes` per wipe (rounded up to one cache line).
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: vec![0_u8; bytes.max(CACHE_LINE_BYTES)],
            pass: 0,
        }
    }

    /// Size of the scratch buffer in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Touch every cache line of the buffer with a volatile write and read,
    /// evicting whatever the previous trial left resident.
    pub fn clear_caches(&mut self) {
        self.pass = self.pass.wrapping_add(1);
        let pass = self.pass;
        let base = self.buffer.as_mut_ptr();
        let mut checksum = 0_u64;

        for offset in (0..self.buffer.len()).step_by(CACHE_LINE_BYTES) {
            // Write then read the line so it is both dirtied and fetched.
            unsafe {
                let line = base.add(offset);
                std::ptr::write_volatile(line, pass);
                checksum = checksum.wrapping_add(u64::from(std::ptr::read_volatile(line)));
            }
        }
        std::hint::black_box(checksum);
    }
}

impl Default for CacheWiper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheWiper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWiper")
            .field("capacity", &self.buffer.len())
            .field("pass", &self.pass)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buffer_is_larger_than_any_llc() {
        let wiper = CacheWiper::new();
        assert_eq!(wiper.capacity(), WIPE_BUFFER_BYTES);
        assert!(wiper.capacity() >= 32 * 1024 * 1024);
    }

    #[test]
    fn tiny_capacity_rounds_up_to_a_line() {
        let wiper = CacheWiper::with_capacity(1);
        assert_eq!(wiper.capacity(), CACHE_LINE_BYTES);
    }

    #[test]
    fn clear_caches_touches_every_line() {
        let mut wiper = CacheWiper::with_capacity(4 * CACHE_LINE_BYTES);
        wiper.clear_caches();
        for offset in (0..wiper.buffer.len()).step_by(CACHE_LINE_BYTES) {
            assert_eq!(wiper.buffer[offset], 1, "line at {offset} untouched");
        }
        wiper.clear_caches();
        assert_eq!(wiper.buffer[0], 2);
    }
}
