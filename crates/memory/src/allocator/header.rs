//! Block tagging
//!
//! Every block handed out through [`Allocator`](super::Allocator) is preceded
//! by a 16-byte [`BlockHeader`] recording which allocator instance produced
//! it and how many usable bytes follow. Reallocate and deallocate check the
//! header before touching anything, so a block passed to the wrong allocator
//! is caught instead of corrupting foreign memory.

use core::fmt;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU32, Ordering};

use super::Strategy;

/// Size of the header in front of every tagged block
pub const HEADER_SIZE: usize = core::mem::size_of::<BlockHeader>();

/// Alignment of every block (header and user data)
pub const BLOCK_ALIGN: usize = 8;

/// In-memory header preceding each tagged block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Raw [`Signature`] of the producing allocator
    pub signature: u64,
    /// Usable bytes after the header
    pub size: u64,
}

const _: () = assert!(HEADER_SIZE == 16);

/// Identity of an allocator instance
///
/// The high 32 bits hold the strategy tag, the low 32 bits a process-unique
/// instance number. The heap is stateless and always uses instance 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(u64);

static NEXT_INSTANCE: AtomicU32 = AtomicU32::new(1);

impl Signature {
    pub const TEMPORARY_TAG: u32 = 0xDEAD_DECA;
    pub const ARENA_TAG: u32 = 0xBABA_BEBE;
    pub const POOL_TAG: u32 = 0xF00D_B10C;
    pub const HEAP_TAG: u32 = 0xC0FF_EE00;

    /// Allocates a fresh signature for a new allocator instance
    pub(crate) fn next(strategy: Strategy) -> Self {
        let mut instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        if instance == 0 {
            // wrapped; 0 is reserved for the heap
            instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        }
        Self::compose(Self::tag_of(strategy), instance)
    }

    /// The shared signature of all heap blocks
    pub const fn heap() -> Self {
        Self::compose(Self::HEAP_TAG, 0)
    }

    const fn compose(tag: u32, instance: u32) -> Self {
        Self(((tag as u64) << 32) | instance as u64)
    }

    const fn tag_of(strategy: Strategy) -> u32 {
        match strategy {
            Strategy::Temporary => Self::TEMPORARY_TAG,
            Strategy::Arena => Self::ARENA_TAG,
            Strategy::Pool => Self::POOL_TAG,
            Strategy::Heap => Self::HEAP_TAG,
        }
    }

    /// Reinterprets a raw header value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn tag(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn instance(self) -> u32 {
        self.0 as u32
    }

    /// Decodes the strategy tag, if it is one of ours
    pub const fn strategy(self) -> Option<Strategy> {
        match self.tag() {
            Self::TEMPORARY_TAG => Some(Strategy::Temporary),
            Self::ARENA_TAG => Some(Strategy::Arena),
            Self::POOL_TAG => Some(Strategy::Pool),
            Self::HEAP_TAG => Some(Strategy::Heap),
            _ => None,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy() {
            Some(strategy) => write!(f, "{strategy}#{}", self.instance()),
            None => write!(f, "unknown({:#018x})", self.0),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

// ============================================================================
// Raw header access
// ============================================================================

/// Writes a header at `block` and returns the user pointer just past it
///
/// # Safety
/// `block` must be valid for writes of `HEADER_SIZE + size` bytes and aligned
/// to [`BLOCK_ALIGN`].
#[inline]
pub(crate) unsafe fn write(block: NonNull<u8>, signature: Signature, size: usize) -> NonNull<u8> {
    let header = BlockHeader {
        signature: signature.raw(),
        size: size as u64,
    };
    unsafe {
        block.cast::<BlockHeader>().write(header);
        block.add(HEADER_SIZE)
    }
}

/// Start of the block (the header) for a user pointer
///
/// # Safety
/// `user` must be a pointer returned by one of this crate's allocators.
#[inline]
pub(crate) unsafe fn block_start(user: NonNull<u8>) -> NonNull<u8> {
    unsafe { user.sub(HEADER_SIZE) }
}

/// # Safety
/// `user` must be a pointer returned by one of this crate's allocators.
#[inline]
pub(crate) unsafe fn read(user: NonNull<u8>) -> BlockHeader {
    unsafe { block_start(user).cast::<BlockHeader>().read() }
}

/// # Safety
/// `user` must be a live block whose header may be rewritten.
#[inline]
pub(crate) unsafe fn set_size(user: NonNull<u8>, size: usize) {
    unsafe {
        let mut header = block_start(user).cast::<BlockHeader>();
        header.as_mut().size = size as u64;
    }
}

/// Reads the header and aborts unless it carries `expected`
///
/// # Safety
/// `user` must be a pointer returned by one of this crate's allocators.
#[track_caller]
pub(crate) unsafe fn verify(expected: Signature, user: NonNull<u8>, operation: &str) -> BlockHeader {
    let header = unsafe { read(user) };
    let found = Signature::from_raw(header.signature);
    if found != expected {
        fatal!("{operation}: block tagged {found} does not belong to {expected}");
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_encodes_strategy_and_instance() {
        let a = Signature::next(Strategy::Arena);
        let b = Signature::next(Strategy::Arena);

        assert_ne!(a, b);
        assert_eq!(a.tag(), Signature::ARENA_TAG);
        assert_eq!(a.strategy(), Some(Strategy::Arena));
        assert_ne!(a.instance(), 0);
    }

    #[test]
    fn heap_signature_is_instance_zero() {
        let heap = Signature::heap();
        assert_eq!(heap.raw() >> 32, u64::from(Signature::HEAP_TAG));
        assert_eq!(heap.instance(), 0);
        assert_eq!(heap.to_string(), "heap#0");
    }

    #[test]
    fn unknown_tag_display() {
        let sig = Signature::from_raw(0x1234_5678_0000_0001);
        assert_eq!(sig.strategy(), None);
        assert!(sig.to_string().starts_with("unknown("));
    }

    #[test]
    fn header_round_trip_in_buffer() {
        let mut buf = [0u64; 4];
        let block = NonNull::new(buf.as_mut_ptr().cast::<u8>()).expect("non-null");
        let sig = Signature::next(Strategy::Pool);

        unsafe {
            let user = write(block, sig, 12);
            assert_eq!(user.as_ptr() as usize - block.as_ptr() as usize, HEADER_SIZE);

            let header = verify(sig, user, "test");
            assert_eq!(header.size, 12);

            set_size(user, 16);
            assert_eq!(read(user).size, 16);
        }
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn verify_rejects_foreign_signature() {
        let mut buf = [0u64; 4];
        let block = NonNull::new(buf.as_mut_ptr().cast::<u8>()).expect("non-null");

        unsafe {
            let user = write(block, Signature::next(Strategy::Arena), 8);
            verify(Signature::next(Strategy::Arena), user, "reallocate");
        }
    }
}
