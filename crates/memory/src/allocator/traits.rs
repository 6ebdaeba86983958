//! Core allocator trait
//!
//! [`Allocator`] is the capability value passed around by string and builder
//! code. It is dyn-compatible, so a `&dyn Allocator` can stand for any of the
//! four strategies.

use core::fmt;
use core::ptr::{self, NonNull};

use super::header::{self, Signature};
use super::sealed::Sealed;
use crate::error::AllocResult;

/// Allocation strategy behind an [`Allocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Fixed-capacity bump buffer with mark/restore
    Temporary,
    /// Fixed-capacity bump region carved from a backing allocator
    Arena,
    /// Growable bump region
    Pool,
    /// Host allocator
    Heap,
}

impl Strategy {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temporary => "temporary",
            Self::Arena => "arena",
            Self::Pool => "pool",
            Self::Heap => "heap",
        }
    }

    /// Whether blocks can be released one by one
    pub const fn supports_free(self) -> bool {
        matches!(self, Self::Pool | Self::Heap)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Polymorphic byte allocator
///
/// Every block starts 8-byte aligned and is preceded by a
/// [`BlockHeader`](super::BlockHeader) carrying the producing instance's
/// [`Signature`]. Passing a block to an allocator that did not produce it is
/// a programmer error and aborts.
///
/// This trait is sealed; the strategies in this crate are the only
/// implementors.
///
/// # Safety
///
/// Implementations must guarantee that:
/// - a successful `allocate(size)` returns a pointer valid for reads and
///   writes of `size` bytes until it is reallocated, deallocated, or its
///   allocator is reset, restored past it, or dropped
/// - the header in front of each block is intact and carries
///   [`signature`](Allocator::signature)
/// - a failed allocation leaves the allocator state untouched
pub unsafe trait Allocator: Sealed {
    /// Strategy of this allocator
    fn strategy(&self) -> Strategy;

    /// Signature written into every block this instance produces
    fn signature(&self) -> Signature;

    /// Allocates `size` bytes
    fn allocate(&self, size: usize) -> AllocResult<NonNull<u8>>;

    /// Allocates `size` zeroed bytes
    fn allocate_zeroed(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let ptr = self.allocate(size)?;
        // SAFETY: `ptr` is valid for `size` bytes.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };
        Ok(ptr)
    }

    /// Resizes a block, preserving the first `min(old, new)` bytes
    ///
    /// On failure the original block is left untouched.
    ///
    /// # Safety
    /// `ptr` must be a live block obtained from an [`Allocator`]. On success
    /// it must no longer be used.
    unsafe fn reallocate(&self, ptr: NonNull<u8>, new_size: usize) -> AllocResult<NonNull<u8>>;

    /// Releases a block
    ///
    /// Bump-backed strategies return
    /// [`MemoryError::NotSupported`](crate::MemoryError::NotSupported) and
    /// leave the memory alone; it is reclaimed by reset or release.
    ///
    /// # Safety
    /// `ptr` must be a live block obtained from an [`Allocator`]. After an
    /// `Ok` return it must no longer be used.
    unsafe fn deallocate(&self, ptr: NonNull<u8>) -> AllocResult<()>;

    /// Usable size of a block produced by this instance
    ///
    /// # Safety
    /// `ptr` must be a live block obtained from an [`Allocator`].
    #[track_caller]
    unsafe fn block_size(&self, ptr: NonNull<u8>) -> usize {
        unsafe { header::verify(self.signature(), ptr, "block_size").size as usize }
    }

    /// Whether `ptr` carries this instance's signature
    ///
    /// # Safety
    /// `ptr` must be a live block obtained from an [`Allocator`].
    unsafe fn owns(&self, ptr: NonNull<u8>) -> bool {
        unsafe { header::read(ptr).signature == self.signature().raw() }
    }
}
