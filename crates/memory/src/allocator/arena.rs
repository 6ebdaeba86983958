//! Arena allocator
//!
//! A fixed-capacity bump region requested from a backing allocator in one
//! piece and returned to it in one piece. Bookkeeping stays in the handle;
//! the region holds only user data.

use core::mem::ManuallyDrop;
use core::ptr::NonNull;
use core::slice;

use super::bump::{Bump, BumpConfig, Mark};
use super::header::Signature;
use super::{Allocator, AllocatorStats, StatisticsProvider, Strategy};
use crate::core::{MemoryUsage, Resettable};
use crate::error::AllocResult;

/// Bump region carved out of a backing allocator
///
/// # Examples
///
/// ```
/// use buddy_memory::allocator::Arena;
///
/// let arena = Arena::new(buddy_memory::heap(), 128)?;
/// assert!(arena.alloc(100).is_ok());
/// assert!(arena.alloc(50).is_err());
/// # Ok::<(), buddy_memory::MemoryError>(())
/// ```
pub struct Arena<'b> {
    backing: &'b dyn Allocator,
    bump: Bump,
}

impl<'b> Arena<'b> {
    /// Requests `capacity` bytes from `backing`
    pub fn new(backing: &'b dyn Allocator, capacity: usize) -> AllocResult<Self> {
        Self::with_config(backing, BumpConfig::default().with_capacity(capacity))
    }

    pub fn with_config(backing: &'b dyn Allocator, config: BumpConfig) -> AllocResult<Self> {
        config.validate()?;
        let base = backing.allocate(config.capacity)?;

        // SAFETY: blocks from any allocator are 8-byte aligned and valid for
        // `capacity` bytes until handed back in `free_region`.
        let bump = unsafe { Bump::new(base, Strategy::Arena, config) };

        #[cfg(feature = "logging")]
        tracing::debug!(
            arena = %bump.signature(),
            backing = %backing.signature(),
            capacity = config.capacity,
            "arena created"
        );

        Ok(Self { backing, bump })
    }

    /// The allocator the region came from
    pub fn backing(&self) -> &'b dyn Allocator {
        self.backing
    }

    pub fn capacity(&self) -> usize {
        self.bump.capacity()
    }

    pub fn used(&self) -> usize {
        self.bump.used()
    }

    pub fn available(&self) -> usize {
        self.bump.available()
    }

    /// Untagged bump allocation of `size` bytes
    #[allow(clippy::mut_from_ref)]
    pub fn alloc(&self, size: usize) -> AllocResult<&mut [u8]> {
        let ptr = self.bump.allocate_raw(size)?;
        // SAFETY: fresh reservation, disjoint from every other live borrow;
        // restore/reset need `&mut self`.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    #[allow(clippy::mut_from_ref)]
    pub fn alloc_zeroed(&self, size: usize) -> AllocResult<&mut [u8]> {
        let bytes = self.alloc(size)?;
        bytes.fill(0);
        Ok(bytes)
    }

    /// Copies `bytes` into the arena
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_copy(&self, bytes: &[u8]) -> AllocResult<&mut [u8]> {
        let dst = self.alloc(bytes.len())?;
        dst.copy_from_slice(bytes);
        Ok(dst)
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

    pub fn reset(&mut self) {
        self.bump.reset();
    }

    /// Returns the region to the backing allocator
    ///
    /// A backing allocator without discrete free (a temporary allocator)
    /// reclaims the region at its next reset; that case is not an error.
    pub fn release(self) -> AllocResult<()> {
        let this = ManuallyDrop::new(self);
        this.free_region()
    }

    fn free_region(&self) -> AllocResult<()> {
        if !self.backing.strategy().supports_free() {
            return Ok(());
        }
        // SAFETY: `base` came from `backing.allocate` and is freed only here
        unsafe { self.backing.deallocate(self.bump.base()) }
    }
}

unsafe impl Allocator for Arena<'_> {
    fn strategy(&self) -> Strategy {
        Strategy::Arena
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

impl Drop for Arena<'_> {
    fn drop(&mut self) {
        if let Err(_err) = self.free_region() {
            #[cfg(feature = "logging")]
            tracing::warn!(
                arena = %self.bump.signature(),
                error = %_err,
                "failed to release arena region"
            );
        }
    }
}

impl core::fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("signature", &self.bump.signature())
            .field("backing", &self.backing.signature())
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .finish()
    }
}

impl MemoryUsage for Arena<'_> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl Resettable for Arena<'_> {
    fn reset(&mut self) {
        Arena::reset(self);
    }
}

impl StatisticsProvider for Arena<'_> {
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
