//! Size-classed memory pools.
//!
//! Every allocation the isolate makes is charged to exactly one
//! [`MemoryPool`], chosen by [`SizeClass::for_size`].  A pool is a bounded
//! byte budget: it never grows and never compacts, so reserving past its
//! capacity fails with an out-of-memory error.  Because each arena slot
//! remembers the size and class it was charged with (see
//! [`crate::gc::handle::Slots`]), a release always returns exactly what was
//! reserved.

use std::fmt;

use crate::error::{CondorError, CondorResult, ErrorKind};

/// Allocations up to this many bytes are served by the small pool.
pub const SMALL_LIMIT: usize = 64;
/// Allocations up to this many bytes are served by the medium pool.
pub const MEDIUM_LIMIT: usize = 256;
/// Allocations up to this many bytes are served by the large pool.
pub const LARGE_LIMIT: usize = 1024;
/// Allocations up to this many bytes are served by the extra-large pool.
pub const EXTRA_LARGE_LIMIT: usize = 64 * 1024;

/// The size bracket a pool serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// `0..=64` bytes.
    Small,
    /// `65..=256` bytes.
    Medium,
    /// `257..=1024` bytes.
    Large,
    /// `1025..=65536` bytes.
    ExtraLarge,
    /// The isolate's own bookkeeping: parser instances and the context.
    SelfPool,
}

impl SizeClass {
    /// Every size class, in pool-table order.
    pub const ALL: [SizeClass; 5] = [
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::ExtraLarge,
        SizeClass::SelfPool,
    ];

    /// The general-purpose class whose bracket covers `size`, or `None` when
    /// the request is larger than every bracket.
    pub fn for_size(size: usize) -> Option<SizeClass> {
        match size {
            0..=SMALL_LIMIT => Some(SizeClass::Small),
            ..=MEDIUM_LIMIT => Some(SizeClass::Medium),
            ..=LARGE_LIMIT => Some(SizeClass::Large),
            ..=EXTRA_LARGE_LIMIT => Some(SizeClass::ExtraLarge),
            _ => None,
        }
    }

    /// Position of this class in the isolate's pool table.
    pub(crate) fn index(self) -> usize {
        match self {
            SizeClass::Small => 0,
            SizeClass::Medium => 1,
            SizeClass::Large => 2,
            SizeClass::ExtraLarge => 3,
            SizeClass::SelfPool => 4,
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
            SizeClass::ExtraLarge => "extra-large",
            SizeClass::SelfPool => "self",
        })
    }
}

/// A fixed-capacity byte budget for one [`SizeClass`].
#[derive(Debug, Clone)]
pub struct MemoryPool {
    class: SizeClass,
    capacity: usize,
    used: usize,
    peak: usize,
    live: usize,
    total_allocations: u64,
}

impl MemoryPool {
    /// Create an empty pool that can hold `capacity` bytes.
    pub fn new(class: SizeClass, capacity: usize) -> Self {
        Self {
            class,
            capacity,
            used: 0,
            peak: 0,
            live: 0,
            total_allocations: 0,
        }
    }

    /// Charge `size` bytes to the pool.
    ///
    /// Fails with [`ErrorKind::OutOfMemory`] when the pool does not have
    /// `size` bytes left; the pool is unchanged in that case.
    pub fn reserve(&mut self, size: usize) -> CondorResult<()> {
        let new_used = self
            .used
            .checked_add(size)
            .filter(|&n| n <= self.capacity)
            .ok_or_else(|| {
                CondorError::from(ErrorKind::OutOfMemory {
                    class: self.class,
                    requested: size,
                })
            })?;
        self.used = new_used;
        self.peak = self.peak.max(new_used);
        self.live += 1;
        self.total_allocations += 1;
        Ok(())
    }

    /// Return `size` bytes previously charged with [`reserve`][Self::reserve].
    pub fn release(&mut self, size: usize) {
        debug_assert!(size <= self.used, "pool released more than it reserved");
        self.used = self.used.saturating_sub(size);
        self.live = self.live.saturating_sub(1);
    }

    /// Forget every reservation.  Used when the isolate is disposed.
    pub fn reset(&mut self) {
        self.used = 0;
        self.live = 0;
    }

    /// The class this pool serves.
    pub fn class(&self) -> SizeClass {
        self.class
    }

    /// Number of bytes currently reserved.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes still available.
    pub fn available(&self) -> usize {
        self.capacity - self.used
    }

    /// High-water mark of `used`.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Number of live reservations.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Number of successful reservations over the pool's lifetime.
    pub fn total_allocations(&self) -> u64 {
        self.total_allocations
    }
}

/// Raw storage handed out by [`crate::isolate::Isolate::allocate`].
///
/// Blocks are zero-initialised and never move; they are addressed through a
/// [`crate::gc::handle::Handle`] rather than a pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    bytes: Box<[u8]>,
}

impl Block {
    pub(crate) fn zeroed(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-byte block.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The block's contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// The block's contents, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_class_brackets() {
        assert_eq!(SizeClass::for_size(0), Some(SizeClass::Small));
        assert_eq!(SizeClass::for_size(64), Some(SizeClass::Small));
        assert_eq!(SizeClass::for_size(65), Some(SizeClass::Medium));
        assert_eq!(SizeClass::for_size(256), Some(SizeClass::Medium));
        assert_eq!(SizeClass::for_size(1024), Some(SizeClass::Large));
        assert_eq!(SizeClass::for_size(1025), Some(SizeClass::ExtraLarge));
        assert_eq!(SizeClass::for_size(EXTRA_LARGE_LIMIT), Some(SizeClass::ExtraLarge));
        assert_eq!(SizeClass::for_size(EXTRA_LARGE_LIMIT + 1), None);
    }

    #[test]
    fn test_pool_table_indices_are_distinct() {
        let mut seen: Vec<usize> = SizeClass::ALL.iter().map(|c| c.index()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reserve_and_release() {
        let mut pool = MemoryPool::new(SizeClass::Small, 128);
        pool.reserve(48).unwrap();
        pool.reserve(48).unwrap();
        assert_eq!(pool.used(), 96);
        assert_eq!(pool.live(), 2);
        pool.release(48);
        assert_eq!(pool.used(), 48);
        assert_eq!(pool.live(), 1);
        assert_eq!(pool.peak(), 96);
        assert_eq!(pool.total_allocations(), 2);
    }

    #[test]
    fn test_reserve_past_capacity_fails_without_side_effects() {
        let mut pool = MemoryPool::new(SizeClass::Medium, 100);
        pool.reserve(80).unwrap();
        let err = pool.reserve(40).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::OutOfMemory {
                class: SizeClass::Medium,
                requested: 40
            }
        );
        assert_eq!(pool.used(), 80);
        assert_eq!(pool.available(), 20);
        assert_eq!(pool.live(), 1);
    }

    #[test]
    fn test_reset_clears_usage_but_keeps_peak() {
        let mut pool = MemoryPool::new(SizeClass::Large, 4096);
        pool.reserve(1000).unwrap();
        pool.reset();
        assert_eq!(pool.used(), 0);
        assert_eq!(pool.live(), 0);
        assert_eq!(pool.peak(), 1000);
    }

    #[test]
    fn test_block_is_zeroed() {
        let mut block = Block::zeroed(16);
        assert_eq!(block.len(), 16);
        assert!(block.as_slice().iter().all(|&b| b == 0));
        block.as_mut_slice()[3] = 7;
        assert_eq!(block.as_slice()[3], 7);
    }
}
