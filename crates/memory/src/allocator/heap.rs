//! Heap allocator
//!
//! Pass-through to the host allocator. Each block still carries a header so
//! the original [`Layout`] can be rebuilt on free and foreign pointers are
//! caught.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::alloc::System;

use super::header::{self, HEADER_SIZE, Signature};
use super::{Allocator, Strategy};
use crate::core::MemoryUsage;
use crate::error::{AllocError, AllocResult};
use crate::utils::checked_add;

const HEAP_ALIGN: usize = 16;

/// Wrapper for the system allocator
///
/// Stateless and thread-safe; every heap block shares the same signature.
/// The process-wide instance is [`crate::heap()`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl HeapAllocator {
    pub const fn new() -> Self {
        Self
    }

    fn layout_for(size: usize) -> AllocResult<Layout> {
        let total = checked_add(HEADER_SIZE, size, "heap layout")?;
        Layout::from_size_align(total, HEAP_ALIGN)
            .map_err(|_| AllocError::size_overflow("heap layout"))
    }

    fn tag(raw: *mut u8, size: usize) -> AllocResult<NonNull<u8>> {
        let block = NonNull::new(raw).ok_or_else(|| AllocError::allocation_failed(size))?;
        // SAFETY: the block spans HEADER_SIZE + size bytes, 16-byte aligned
        Ok(unsafe { header::write(block, Signature::heap(), size) })
    }
}

unsafe impl Allocator for HeapAllocator {
    fn strategy(&self) -> Strategy {
        Strategy::Heap
    }

    fn signature(&self) -> Signature {
        Signature::heap()
    }

    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let layout = Self::layout_for(size)?;
        // SAFETY: layout is non-zero sized (header included)
        Self::tag(unsafe { System.alloc(layout) }, size)
    }

    fn allocate_zeroed(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let layout = Self::layout_for(size)?;
        // SAFETY: layout is non-zero sized (header included)
        Self::tag(unsafe { System.alloc_zeroed(layout) }, size)
    }

    unsafe fn reallocate(&self, ptr: NonNull<u8>, new_size: usize) -> AllocResult<NonNull<u8>> {
        let old_size = unsafe { header::verify(Signature::heap(), ptr, "reallocate") }.size as usize;
        let old_layout = Self::layout_for(old_size)?;
        let new_total = Self::layout_for(new_size)?.size();

        // SAFETY: the block was allocated by System with `old_layout`
        let raw = unsafe { System.realloc(header::block_start(ptr).as_ptr(), old_layout, new_total) };
        Self::tag(raw, new_size)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>) -> AllocResult<()> {
        let size = unsafe { header::verify(Signature::heap(), ptr, "deallocate") }.size as usize;
        let layout = Self::layout_for(size)?;
        // SAFETY: the block was allocated by System with `layout`
        unsafe { System.dealloc(header::block_start(ptr).as_ptr(), layout) };
        Ok(())
    }
}

// The heap keeps no books; usage is unknown.
impl MemoryUsage for HeapAllocator {
    fn used_memory(&self) -> usize {
        0
    }

    fn available_memory(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use core::slice;

    use super::*;

    #[test]
    fn test_basic_allocation() {
        let heap = HeapAllocator::new();
        let ptr = heap.allocate(32).expect("alloc");
        assert_eq!(ptr.as_ptr() as usize % 8, 0);
        unsafe {
            assert_eq!(heap.block_size(ptr), 32);
            heap.deallocate(ptr).expect("free");
        }
    }

    #[test]
    fn test_zeroed_allocation() {
        let heap = HeapAllocator::new();
        let ptr = heap.allocate_zeroed(64).expect("alloc");
        unsafe {
            assert!(slice::from_raw_parts(ptr.as_ptr(), 64).iter().all(|&b| b == 0));
            heap.deallocate(ptr).expect("free");
        }
    }

    #[test]
    fn test_reallocate_preserves_content() {
        let heap = HeapAllocator::new();
        unsafe {
            let ptr = heap.allocate(5).expect("alloc");
            ptr.as_ptr().copy_from_nonoverlapping(b"hello".as_ptr(), 5);

            let grown = heap.reallocate(ptr, 4096).expect("grow");
            assert_eq!(slice::from_raw_parts(grown.as_ptr(), 5), b"hello");
            assert_eq!(heap.block_size(grown), 4096);

            let shrunk = heap.reallocate(grown, 2).expect("shrink");
            assert_eq!(slice::from_raw_parts(shrunk.as_ptr(), 2), b"he");
            heap.deallocate(shrunk).expect("free");
        }
    }

    #[test]
    fn test_zero_sized_allocation() {
        let heap = HeapAllocator::new();
        let ptr = heap.allocate(0).expect("alloc");
        unsafe {
            assert_eq!(heap.block_size(ptr), 0);
            heap.deallocate(ptr).expect("free");
        }
    }

    #[test]
    fn test_overflow_is_reported() {
        let heap = HeapAllocator::new();
        assert!(matches!(
            heap.allocate(usize::MAX),
            Err(AllocError::SizeOverflow { .. })
        ));
    }

    #[test]
    fn test_heap_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HeapAllocator>();
    }
}
