//! Temporary allocator
//!
//! A fixed-capacity bump buffer taken from the heap once and returned when the
//! allocator is dropped. Individual blocks are never freed; memory comes back
//! through [`TempAllocator::restore`] or [`TempAllocator::reset`].

use core::ptr::NonNull;
use core::slice;

use super::{Bump, BumpConfig, Mark, TempScope};
use crate::allocator::header::Signature;
use crate::allocator::{
    Allocator, AllocatorStats, StatisticsProvider, Strategy,
};
use crate::core::{MemoryUsage, Resettable};
use crate::error::AllocResult;

/// Fixed-capacity bump allocator with mark/restore
///
/// # Examples
///
/// ```
/// use buddy_memory::allocator::TempAllocator;
///
/// let mut temp = TempAllocator::with_capacity(1024)?;
/// let mark = temp.mark();
/// temp.alloc_slice(100)?.fill(7);
/// temp.restore(mark);
/// assert_eq!(temp.used(), mark.offset());
/// # Ok::<(), buddy_memory::MemoryError>(())
/// ```
#[derive(Debug)]
pub struct TempAllocator {
    bump: Bump,
}

impl TempAllocator {
    /// Creates an allocator with the default 8 MiB buffer
    pub fn new() -> AllocResult<Self> {
        Self::with_config(BumpConfig::default())
    }

    pub fn with_capacity(capacity: usize) -> AllocResult<Self> {
        Self::with_config(BumpConfig::default().with_capacity(capacity))
    }

    pub fn with_config(config: BumpConfig) -> AllocResult<Self> {
        config.validate()?;
        let base = crate::heap().allocate(config.capacity)?;

        #[cfg(feature = "logging")]
        tracing::debug!(capacity = config.capacity, "temporary allocator created");

        // SAFETY: the heap block is 16-byte aligned and `capacity` bytes long;
        // it is returned in Drop.
        let bump = unsafe { Bump::new(base, Strategy::Temporary, config) };
        Ok(Self { bump })
    }

    #[inline]
    pub(crate) fn core(&self) -> &Bump {
        &self.bump
    }

    pub fn capacity(&self) -> usize {
        self.bump.capacity()
    }

    /// Bytes consumed so far, headers and padding included
    pub fn used(&self) -> usize {
        self.bump.used()
    }

    pub fn available(&self) -> usize {
        self.bump.available()
    }

    pub fn config(&self) -> &BumpConfig {
        self.bump.config()
    }

    /// Number of resets so far
    pub fn generation(&self) -> u32 {
        self.bump.generation()
    }

    pub fn mark(&self) -> Mark {
        self.bump.mark()
    }

    /// Rewinds to `mark`
    ///
    /// # Panics
    /// If `mark` belongs to another allocator, predates the last reset, or
    /// lies ahead of the current position.
    #[track_caller]
    pub fn restore(&mut self, mark: Mark) {
        self.bump.restore(mark);
    }

    /// Discards every allocation and invalidates all outstanding marks
    pub fn reset(&mut self) {
        self.bump.reset();
    }

    /// Marks now and restores when the returned guard is dropped
    pub fn scope(&mut self) -> TempScope<'_> {
        TempScope::new(self)
    }

    /// Allocates a header-tagged byte slice
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice(&self, size: usize) -> AllocResult<&mut [u8]> {
        let ptr = self.bump.allocate(size)?;
        // SAFETY: fresh reservation, disjoint from every other live borrow;
        // restore/reset need `&mut self`.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// Allocates a zeroed, header-tagged byte slice
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_zeroed_slice(&self, size: usize) -> AllocResult<&mut [u8]> {
        let bytes = self.alloc_slice(size)?;
        bytes.fill(0);
        Ok(bytes)
    }
}

unsafe impl Allocator for TempAllocator {
    fn strategy(&self) -> Strategy {
        Strategy::Temporary
    }

    fn signature(&self) -> Signature {
        self.bump.signature()
    }

    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        self.bump.allocate(size)
    }

    unsafe fn reallocate(&self, ptr: NonNull<u8>, new_size: usize) -> AllocResult<NonNull<u8>> {
        unsafe { self.bump.reallocate(ptr, new_size) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) -> AllocResult<()> {
        unsafe { self.bump.deallocate(ptr) }
    }
}

impl Drop for TempAllocator {
    fn drop(&mut self) {
        // SAFETY: the buffer came from the heap in `with_config`
        let result = unsafe { crate::heap().deallocate(self.bump.base()) };
        debug_assert!(result.is_ok());
    }
}

impl MemoryUsage for TempAllocator {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl Resettable for TempAllocator {
    fn reset(&mut self) {
        TempAllocator::reset(self);
    }
}

impl StatisticsProvider for TempAllocator {
    fn statistics(&self) -> AllocatorStats {
        self.bump.statistics()
    }

    fn reset_statistics(&self) {
        self.bump.stats().reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.bump.stats().is_enabled()
    }
}
