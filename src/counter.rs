//! # CacheLine
//!
//! The shared unit of contention: a cache-line-sized block of unsigned
//! 64-bit counter slots. All concurrent mutation in this crate happens
//! against slots of a [`CacheLine`], through atomic operations only.
//!
//! Sizing the block to one cache line keeps independently probed slots
//! from false-sharing with neighbouring data: the whole block is invalidated
//! as a unit, and nothing else lives on that line.

use core::sync::atomic::{AtomicU64, Ordering::SeqCst};

/// Number of 64-bit slots in one [`CacheLine`].
pub const SLOTS: usize = 8;

const ZEROED: AtomicU64 = AtomicU64::new(0);

/// A cache-line-sized, cache-line-aligned array of atomic counter slots.
///
/// Freshly constructed lines are zeroed. The mutation benchmark uses slot 0;
/// the lock and ordering demonstrations use slots the same way.
///
/// # Example
/// ```
/// use contend::CacheLine;
/// use core::sync::atomic::Ordering::SeqCst;
///
/// let line = CacheLine::new();
/// line.slot(0).fetch_add(1, SeqCst);
/// assert_eq!(line.load(0), 1);
/// ```
#[repr(C, align(64))]
pub struct CacheLine {
    slots: [AtomicU64; SLOTS],
}

impl CacheLine {
    /// Creates a zeroed cache line.
    #[inline(always)]
    pub const fn new() -> Self {
        CacheLine {
            slots: [ZEROED; SLOTS],
        }
    }

    /// Borrows one slot for direct atomic access.
    ///
    /// # Panics
    /// Panics if `idx >= SLOTS`.
    #[inline(always)]
    pub fn slot(&self, idx: usize) -> &AtomicU64 {
        &self.slots[idx]
    }

    /// Loads the current value of a slot (sequentially consistent).
    #[inline(always)]
    pub fn load(&self, idx: usize) -> u64 {
        self.slots[idx].load(SeqCst)
    }
}

impl Default for CacheLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_line_is_zeroed() {
        let line = CacheLine::new();
        for idx in 0..SLOTS {
            assert_eq!(line.load(idx), 0);
        }
    }

    #[test]
    fn test_line_is_cache_line_sized() {
        assert_eq!(core::mem::size_of::<CacheLine>(), 64);
        assert_eq!(core::mem::align_of::<CacheLine>(), 64);
    }

    #[test]
    fn test_slots_are_independent() {
        let line = CacheLine::new();
        line.slot(0).store(7, SeqCst);
        line.slot(3).store(11, SeqCst);
        assert_eq!(line.load(0), 7);
        assert_eq!(line.load(3), 11);
        assert_eq!(line.load(1), 0);
    }
}
