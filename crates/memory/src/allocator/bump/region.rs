//! Raw bump region
//!
//! A contiguous byte range with a single `head` offset. Reservations are
//! 8-byte aligned and never overlap; `head` only moves backwards through the
//! explicit rewind operations.

use core::cell::Cell;
use core::ptr::{self, NonNull};

use crate::allocator::header::{self, BLOCK_ALIGN, HEADER_SIZE, Signature};
use crate::utils::checked_align_up;

/// Invariant: `0 <= head <= capacity`, and `base` is aligned to [`BLOCK_ALIGN`].
#[derive(Debug)]
pub(crate) struct BumpRegion {
    base: NonNull<u8>,
    capacity: usize,
    head: Cell<usize>,
}

impl BumpRegion {
    /// # Safety
    /// `base` must be valid for reads and writes of `capacity` bytes for as
    /// long as the region is used, and aligned to [`BLOCK_ALIGN`].
    pub(crate) const unsafe fn new(base: NonNull<u8>, capacity: usize) -> Self {
        Self {
            base,
            capacity,
            head: Cell::new(0),
        }
    }

    #[inline]
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.base
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn head(&self) -> usize {
        self.head.get()
    }

    #[inline]
    pub(crate) fn available(&self) -> usize {
        self.capacity - self.head.get()
    }

    /// Reserves `size` untagged bytes
    pub(crate) fn reserve(&self, size: usize) -> Option<NonNull<u8>> {
        let start = checked_align_up(self.head.get(), BLOCK_ALIGN)?;
        let end = start.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        self.head.set(end);
        // SAFETY: start <= end <= capacity
        Some(unsafe { self.base.add(start) })
    }

    /// Reserves a header plus `size` bytes and tags it with `signature`
    pub(crate) fn reserve_block(&self, signature: Signature, size: usize) -> Option<NonNull<u8>> {
        let block = self.reserve(HEADER_SIZE.checked_add(size)?)?;
        // SAFETY: the reservation covers HEADER_SIZE + size aligned bytes
        Some(unsafe { header::write(block, signature, size) })
    }

    pub(crate) fn contains(&self, ptr: NonNull<u8>) -> bool {
        let base = self.base.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= base && addr - base <= self.capacity
    }

    /// Offset of `ptr` from `base`; `ptr` must be inside the region
    pub(crate) fn offset_of(&self, ptr: NonNull<u8>) -> usize {
        debug_assert!(self.contains(ptr));
        ptr.as_ptr() as usize - self.base.as_ptr() as usize
    }

    /// Whether the block at `user` of `size` bytes is the newest one
    pub(crate) fn is_tail(&self, user: NonNull<u8>, size: usize) -> bool {
        self.contains(user) && self.offset_of(user).checked_add(size) == Some(self.head.get())
    }

    /// Grows the newest block in place
    pub(crate) fn try_extend_tail(&self, user: NonNull<u8>, old_size: usize, new_size: usize) -> bool {
        if !self.is_tail(user, old_size) {
            return false;
        }
        match self.offset_of(user).checked_add(new_size) {
            Some(end) if end <= self.capacity => {
                self.head.set(end);
                true
            }
            _ => false,
        }
    }

    /// Gives back the newest block, header included
    pub(crate) fn release_tail(&self, user: NonNull<u8>, size: usize) -> bool {
        if !self.is_tail(user, size) {
            return false;
        }
        self.head.set(self.offset_of(user) - HEADER_SIZE);
        true
    }

    pub(crate) fn rewind_to(&self, offset: usize) {
        debug_assert!(offset <= self.head.get());
        self.head.set(offset);
    }

    /// Fills `[from, to)` with `pattern`
    pub(crate) fn fill(&self, from: usize, to: usize, pattern: u8) {
        debug_assert!(from <= to && to <= self.capacity);
        // SAFETY: the range lies inside the region
        unsafe { ptr::write_bytes(self.base.as_ptr().add(from), pattern, to - from) };
    }
}
