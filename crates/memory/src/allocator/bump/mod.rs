//! Bump allocation
//!
//! Both the temporary allocator and arenas are a bump region plus a little
//! bookkeeping. [`Bump`] holds that shared core: tagged allocation,
//! copy-on-grow reallocation, marks and reset.
//!
//! ## Invariants
//!
//! - Allocated ranges never overlap
//! - `head` only moves backwards through restore or reset
//! - A [`Mark`] is valid only for its owner and the generation it was taken in

use core::cell::Cell;
use core::ptr::{self, NonNull};

mod checkpoint;
mod config;
mod region;
pub mod scratch;
mod temporary;

pub use checkpoint::{Mark, TempScope};
pub use config::{BumpConfig, TEMP_ALLOC_BUFSIZE};
pub(crate) use region::BumpRegion;
pub use temporary::TempAllocator;

use crate::allocator::header::{self, Signature};
use crate::allocator::{AllocatorStats, OptionalStats, Strategy};
use crate::error::{AllocError, AllocResult};

/// Shared bump core behind [`TempAllocator`] and [`Arena`](super::Arena)
#[derive(Debug)]
pub(crate) struct Bump {
    region: BumpRegion,
    signature: Signature,
    strategy: Strategy,
    generation: Cell<u32>,
    config: BumpConfig,
    stats: OptionalStats,
}

impl Bump {
    /// # Safety
    /// `base` must be valid for `config.capacity` bytes for the lifetime of
    /// the core and aligned to [`header::BLOCK_ALIGN`].
    pub(crate) unsafe fn new(base: NonNull<u8>, strategy: Strategy, config: BumpConfig) -> Self {
        Self {
            region: unsafe { BumpRegion::new(base, config.capacity) },
            signature: Signature::next(strategy),
            strategy,
            generation: Cell::new(0),
            config,
            stats: OptionalStats::new(config.track_stats),
        }
    }

    #[inline]
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.region.base()
    }

    #[inline]
    pub(crate) fn signature(&self) -> Signature {
        self.signature
    }

    #[inline]
    pub(crate) fn strategy(&self) -> Strategy {
        self.strategy
    }

    #[inline]
    pub(crate) fn config(&self) -> &BumpConfig {
        &self.config
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.region.capacity()
    }

    #[inline]
    pub(crate) fn used(&self) -> usize {
        self.region.head()
    }

    #[inline]
    pub(crate) fn available(&self) -> usize {
        self.region.available()
    }

    #[inline]
    pub(crate) fn generation(&self) -> u32 {
        self.generation.get()
    }

    fn exhausted(&self, requested: usize) -> AllocError {
        self.stats.record_allocation_failure();
        AllocError::exhausted(self.strategy, requested, self.region.available())
    }

    fn paint(&self, ptr: NonNull<u8>, size: usize) {
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: freshly reserved, `size` bytes
            unsafe { ptr::write_bytes(ptr.as_ptr(), pattern, size) };
        }
    }

    fn tagged_block(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let ptr = self
            .region
            .reserve_block(self.signature, size)
            .ok_or_else(|| self.exhausted(size))?;
        self.paint(ptr, size);
        Ok(ptr)
    }

    /// Header-tagged allocation
    pub(crate) fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let ptr = self.tagged_block(size)?;
        self.stats.record_allocation(size);
        Ok(ptr)
    }

    /// Untagged allocation; the bytes carry no header
    pub(crate) fn allocate_raw(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let ptr = self
            .region
            .reserve(size)
            .ok_or_else(|| self.exhausted(size))?;
        self.paint(ptr, size);
        self.stats.record_allocation(size);
        Ok(ptr)
    }

    /// Allocates a fresh block and copies; the old space is not reclaimed
    ///
    /// # Safety
    /// `ptr` must be a live block obtained from an allocator in this crate.
    #[track_caller]
    pub(crate) unsafe fn reallocate(&self, ptr: NonNull<u8>, new_size: usize) -> AllocResult<NonNull<u8>> {
        let old_size = unsafe { header::verify(self.signature, ptr, "reallocate") }.size as usize;
        let new_ptr = self.tagged_block(new_size)?;
        // SAFETY: distinct reservations never overlap
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old_size.min(new_size));
        }
        self.stats.record_reallocation(old_size, new_size);
        Ok(new_ptr)
    }

    /// # Safety
    /// `ptr` must be a live block obtained from an allocator in this crate.
    #[track_caller]
    pub(crate) unsafe fn deallocate(&self, ptr: NonNull<u8>) -> AllocResult<()> {
        unsafe { header::verify(self.signature, ptr, "deallocate") };
        Err(AllocError::not_supported("deallocate", self.strategy))
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            owner: self.signature,
            offset: self.region.head(),
            generation: self.generation.get(),
        }
    }

    /// Whether `mark` can still be restored
    pub(crate) fn accepts(&self, mark: Mark) -> bool {
        mark.owner == self.signature
            && mark.generation == self.generation.get()
            && mark.offset <= self.region.head()
    }

    #[track_caller]
    pub(crate) fn restore(&self, mark: Mark) {
        if mark.owner != self.signature {
            fatal!(
                "restore: mark from {} does not belong to {}",
                mark.owner,
                self.signature
            );
        }
        if mark.generation != self.generation.get() {
            fatal!(
                "restore: stale mark from generation {} on {} (now at {})",
                mark.generation,
                self.signature,
                self.generation.get()
            );
        }
        if mark.offset > self.region.head() {
            fatal!(
                "restore: mark offset {} is ahead of head {} on {}",
                mark.offset,
                self.region.head(),
                self.signature
            );
        }
        self.rewind(mark.offset);
    }

    pub(crate) fn reset(&self) {
        self.rewind(0);
        self.generation.set(self.generation.get().wrapping_add(1));

        #[cfg(feature = "logging")]
        tracing::trace!(
            signature = %self.signature,
            generation = self.generation.get(),
            "bump region reset"
        );
    }

    fn rewind(&self, offset: usize) {
        let head = self.region.head();
        if let Some(pattern) = self.config.dealloc_pattern {
            self.region.fill(offset, head, pattern);
        }
        self.stats.record_release(head - offset);
        self.region.rewind_to(offset);
    }

    pub(crate) fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot().unwrap_or_default()
    }

    pub(crate) fn stats(&self) -> &OptionalStats {
        &self.stats
    }
}
