//! Pool allocator
//!
//! A growable bump allocator. When a request does not fit the current chunk,
//! the pool asks its backing allocator for a larger chunk (the current
//! capacity times `growth_factor`, repeated until the request fits) and
//! continues there. Older chunks stay alive until [`PoolAllocator::reset`]
//! or drop, so blocks never move once handed out.
//!
//! Chunk capacities count usable bytes. Each chunk is requested with room
//! for one block header on top, so a block of exactly the chunk's capacity
//! fits a fresh chunk.
//!
//! The newest block of the current chunk is special: it can grow in place on
//! reallocate and is given back on deallocate. Every other block is
//! reclaimed in bulk.

mod config;

pub use config::PoolConfig;

use core::cell::{Cell, RefCell};
use core::ptr::{self, NonNull};

use super::bump::BumpRegion;
use super::header::{self, HEADER_SIZE, Signature};
use super::{Allocator, AllocatorStats, OptionalStats, StatisticsProvider, Strategy};
use crate::core::{MemoryUsage, Resettable};
use crate::error::{AllocError, AllocResult};
use crate::utils::{checked_add, checked_mul};

/// Growable bump allocator over a backing allocator
pub struct PoolAllocator<'b> {
    backing: &'b dyn Allocator,
    chunks: RefCell<Vec<BumpRegion>>,
    signature: Signature,
    config: PoolConfig,
    growths: Cell<usize>,
    stats: OptionalStats,
}

impl<'b> PoolAllocator<'b> {
    /// Creates a pool whose first chunk holds `initial_capacity` bytes
    pub fn new(backing: &'b dyn Allocator, initial_capacity: usize) -> AllocResult<Self> {
        Self::with_config(
            backing,
            PoolConfig::default().with_initial_capacity(initial_capacity),
        )
    }

    pub fn with_config(backing: &'b dyn Allocator, config: PoolConfig) -> AllocResult<Self> {
        config.validate()?;
        let first = Self::chunk(backing, config.initial_capacity)?;
        let signature = Signature::next(Strategy::Pool);

        #[cfg(feature = "logging")]
        tracing::debug!(
            pool = %signature,
            backing = %backing.signature(),
            capacity = config.initial_capacity,
            "pool created"
        );

        Ok(Self {
            backing,
            chunks: RefCell::new(vec![first]),
            signature,
            config,
            growths: Cell::new(0),
            stats: OptionalStats::new(config.track_stats),
        })
    }

    fn chunk(backing: &dyn Allocator, capacity: usize) -> AllocResult<BumpRegion> {
        let len = checked_add(capacity, HEADER_SIZE, "pool chunk")?;
        let base = backing.allocate(len)?;
        // SAFETY: blocks are 8-byte aligned and stay valid until handed back
        // in `free_chunk`.
        Ok(unsafe { BumpRegion::new(base, len) })
    }

    fn payload(region: &BumpRegion) -> usize {
        region.capacity() - HEADER_SIZE
    }

    fn free_chunk(&self, region: &BumpRegion) {
        if !self.backing.strategy().supports_free() {
            return;
        }
        // SAFETY: every chunk base came from `backing.allocate`
        match unsafe { self.backing.deallocate(region.base()) } {
            Ok(()) => {}
            Err(_err) => {
                #[cfg(feature = "logging")]
                tracing::warn!(pool = %self.signature, error = %_err, "failed to release pool chunk");
            }
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of times the pool has taken a larger chunk
    pub fn growth_count(&self) -> usize {
        self.growths.get()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.borrow().len()
    }

    /// Capacity of the chunk currently serving requests
    pub fn capacity(&self) -> usize {
        self.chunks.borrow().last().map_or(0, Self::payload)
    }

    /// Capacity of all chunks together
    pub fn total_capacity(&self) -> usize {
        self.chunks.borrow().iter().map(Self::payload).sum()
    }

    /// Bytes held from the backing allocator, header room included
    pub fn footprint(&self) -> usize {
        self.chunks.borrow().iter().map(BumpRegion::capacity).sum()
    }

    /// Bytes consumed across all chunks, headers and padding included
    pub fn used(&self) -> usize {
        self.chunks.borrow().iter().map(BumpRegion::head).sum()
    }

    /// Bytes left in the current chunk
    pub fn available(&self) -> usize {
        self.chunks.borrow().last().map_or(0, BumpRegion::available)
    }

    fn next_capacity(&self, size: usize) -> AllocResult<usize> {
        let mut capacity = self.capacity();
        loop {
            capacity = checked_mul(capacity, self.config.growth_factor, "pool growth")?;
            if capacity >= size {
                break;
            }
        }

        match self.config.max_capacity {
            Some(max) if capacity > max => Err(AllocError::growth_limit(capacity, max)),
            _ => Ok(capacity),
        }
    }

    fn grow(&self, size: usize) -> AllocResult<()> {
        let capacity = self.next_capacity(size)?;
        let region = Self::chunk(self.backing, capacity)?;

        self.chunks.borrow_mut().push(region);
        self.growths.set(self.growths.get() + 1);

        #[cfg(feature = "logging")]
        tracing::debug!(
            pool = %self.signature,
            capacity,
            growths = self.growths.get(),
            "pool grew"
        );

        Ok(())
    }

    fn reserve_current(&self, size: usize) -> Option<NonNull<u8>> {
        let ptr = self
            .chunks
            .borrow()
            .last()?
            .reserve_block(self.signature, size)?;
        self.paint(ptr, size);
        Some(ptr)
    }

    fn paint(&self, ptr: NonNull<u8>, size: usize) {
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: `size` freshly reserved bytes
            unsafe { ptr::write_bytes(ptr.as_ptr(), pattern, size) };
        }
    }

    fn block(&self, size: usize) -> AllocResult<NonNull<u8>> {
        if let Some(ptr) = self.reserve_current(size) {
            return Ok(ptr);
        }

        if let Err(err) = self.grow(size) {
            self.stats.record_allocation_failure();
            return Err(err);
        }

        self.reserve_current(size).ok_or_else(|| {
            self.stats.record_allocation_failure();
            AllocError::exhausted(Strategy::Pool, size, self.available())
        })
    }

    /// Keeps only the first chunk and rewinds it
    pub fn reset(&mut self) {
        let mut chunks = core::mem::take(self.chunks.get_mut());
        let released = chunks.iter().map(BumpRegion::head).sum();

        if chunks.len() > 1 {
            for region in chunks.drain(1..) {
                self.free_chunk(&region);
            }
        }
        if let Some(first) = chunks.first() {
            first.rewind_to(0);
        }

        *self.chunks.get_mut() = chunks;
        self.stats.record_release(released);
    }
}

unsafe impl Allocator for PoolAllocator<'_> {
    fn strategy(&self) -> Strategy {
        Strategy::Pool
    }

    fn signature(&self) -> Signature {
        self.signature
    }

    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let ptr = self.block(size)?;
        self.stats.record_allocation(size);
        Ok(ptr)
    }

    /// Grows a block; shrinking is a programmer error
    unsafe fn reallocate(&self, ptr: NonNull<u8>, new_size: usize) -> AllocResult<NonNull<u8>> {
        let old_size = unsafe { header::verify(self.signature, ptr, "reallocate") }.size as usize;

        if new_size < old_size {
            fatal!(
                "reallocate: pool blocks only grow ({old_size} -> {new_size} bytes on {})",
                self.signature
            );
        }
        if new_size == old_size {
            return Ok(ptr);
        }

        let extended = self
            .chunks
            .borrow()
            .last()
            .is_some_and(|chunk| chunk.try_extend_tail(ptr, old_size, new_size));

        if extended {
            // SAFETY: the block now spans `new_size` bytes
            unsafe {
                header::set_size(ptr, new_size);
                self.paint(ptr.add(old_size), new_size - old_size);
            }
            self.stats.record_reallocation(old_size, new_size);
            return Ok(ptr);
        }

        let new_ptr = self.block(new_size)?;
        // SAFETY: distinct blocks never overlap
        unsafe { ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old_size) };
        self.stats.record_reallocation(old_size, new_size);
        Ok(new_ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) -> AllocResult<()> {
        let size = unsafe { header::verify(self.signature, ptr, "deallocate") }.size as usize;

        if let Some(chunk) = self.chunks.borrow().last() {
            chunk.release_tail(ptr, size);
        }
        self.stats.record_deallocation(size);
        Ok(())
    }
}

impl Drop for PoolAllocator<'_> {
    fn drop(&mut self) {
        for region in core::mem::take(self.chunks.get_mut()) {
            self.free_chunk(&region);
        }
    }
}

impl core::fmt::Debug for PoolAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("signature", &self.signature)
            .field("backing", &self.backing.signature())
            .field("chunks", &self.chunk_count())
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("growths", &self.growth_count())
            .finish()
    }
}

/// Whole-pool figures: `total_memory` is the [`footprint`](PoolAllocator::footprint).
/// Space stranded at the end of older chunks counts as available.
impl MemoryUsage for PoolAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.footprint() - self.used())
    }
}

impl Resettable for PoolAllocator<'_> {
    fn reset(&mut self) {
        PoolAllocator::reset(self);
    }
}

impl StatisticsProvider for PoolAllocator<'_> {
    fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot().unwrap_or_default()
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.stats.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: usize) -> PoolAllocator<'static> {
        PoolAllocator::new(crate::heap(), capacity).expect("pool")
    }

    #[test]
    fn grows_instead_of_failing() {
        let pool = pool(64);
        pool.allocate(40).expect("fits");
        assert_eq!(pool.growth_count(), 0);

        pool.allocate(40).expect("grows");
        assert_eq!(pool.growth_count(), 1);
        assert_eq!(pool.chunk_count(), 2);
        assert_eq!(pool.capacity(), 128);
    }

    #[test]
    fn block_of_full_capacity_fits_first_chunk() {
        let pool = pool(64);
        pool.allocate(64).expect("fits");
        assert_eq!(pool.growth_count(), 0);
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.footprint(), 64 + HEADER_SIZE);
    }

    #[test]
    fn memory_usage_covers_every_chunk() {
        let pool = pool(64);
        pool.allocate(40).expect("fits");
        pool.allocate(40).expect("grows");

        assert_eq!(pool.used(), 2 * (HEADER_SIZE + 40));
        assert_eq!(pool.footprint(), (64 + HEADER_SIZE) + (128 + HEADER_SIZE));
        assert_eq!(pool.total_memory(), Some(pool.footprint()));
        assert_eq!(pool.memory_usage_percent(), Some(50.0));
    }

    #[test]
    fn growth_repeats_factor_until_fit() {
        let pool = pool(64);
        pool.allocate(1000).expect("grows");
        assert_eq!(pool.capacity(), 1024);
        assert_eq!(pool.growth_count(), 1);
    }

    #[test]
    fn growth_limit_is_reported() {
        let pool = PoolAllocator::with_config(
            crate::heap(),
            PoolConfig::default()
                .with_initial_capacity(64)
                .with_max_capacity(128),
        )
        .expect("pool");

        let err = pool.allocate(500).expect_err("limit");
        assert!(matches!(err, AllocError::GrowthLimit { .. }));
        assert_eq!(pool.chunk_count(), 1);
        assert_eq!(pool.growth_count(), 0);
    }

    #[test]
    fn tail_block_grows_in_place() {
        let pool = pool(128);
        let ptr = pool.allocate(16).expect("alloc");
        let grown = unsafe { pool.reallocate(ptr, 48) }.expect("grow");
        assert_eq!(grown, ptr);
        assert_eq!(unsafe { pool.block_size(grown) }, 48);
    }

    #[test]
    fn non_tail_block_is_copied() {
        let pool = pool(256);
        let first = pool.allocate(8).expect("first");
        unsafe { ptr::copy_nonoverlapping(b"abcdefgh".as_ptr(), first.as_ptr(), 8) };
        pool.allocate(8).expect("second");

        let moved = unsafe { pool.reallocate(first, 16) }.expect("grow");
        assert_ne!(moved, first);
        let bytes = unsafe { core::slice::from_raw_parts(moved.as_ptr(), 8) };
        assert_eq!(bytes, b"abcdefgh");
    }

    #[test]
    fn equal_size_returns_same_block() {
        let pool = pool(128);
        let ptr = pool.allocate(16).expect("alloc");
        pool.allocate(16).expect("other");
        assert_eq!(unsafe { pool.reallocate(ptr, 16) }.expect("same"), ptr);
    }

    #[test]
    #[should_panic(expected = "pool blocks only grow")]
    fn shrinking_is_fatal() {
        let pool = pool(128);
        let ptr = pool.allocate(32).expect("alloc");
        let _ = unsafe { pool.reallocate(ptr, 8) };
    }

    #[test]
    fn freeing_tail_rewinds() {
        let pool = pool(128);
        pool.allocate(8).expect("first");
        let used = pool.used();
        let tail = pool.allocate(24).expect("tail");

        unsafe { pool.deallocate(tail) }.expect("free");
        assert_eq!(pool.used(), used);
    }

    #[test]
    fn reset_keeps_first_chunk() {
        let mut pool = pool(64);
        pool.allocate(200).expect("grow");
        assert_eq!(pool.chunk_count(), 2);

        pool.reset();
        assert_eq!(pool.chunk_count(), 1);
        assert_eq!(pool.used(), 0);
        assert_eq!(pool.capacity(), 64);
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn foreign_block_is_fatal() {
        let a = pool(64);
        let b = pool(64);
        let ptr = a.allocate(8).expect("alloc");
        let _ = unsafe { b.reallocate(ptr, 16) };
    }
}
