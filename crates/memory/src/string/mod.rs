//! Owned byte strings
//!
//! [`ByteString`] is an immutable-length byte sequence that is either owned
//! (allocated through some [`Allocator`] and released through the same one),
//! a borrowed view, or an error value. Errors flow through every operation
//! instead of panicking: queries on an error return empty results, and
//! operations that produce a new string produce an error string.

mod builder;

pub use builder::{ByteBuilder, DEFAULT_BUILDER_CAPACITY};

use core::fmt;
use core::ptr::NonNull;
use core::slice;

use crate::allocator::Allocator;
use crate::error::ValueError;

enum Repr<'a> {
    Owned {
        ptr: NonNull<u8>,
        len: usize,
        alloc: &'a dyn Allocator,
    },
    View(&'a [u8]),
    Error(ValueError),
}

/// Byte string tied to the allocator (or buffer) it came from
///
/// # Examples
///
/// ```
/// use buddy_memory::string::ByteString;
///
/// let s = ByteString::copy_from(buddy_memory::heap(), b"123456789");
/// assert_eq!(s.view(3, 6), "456");
/// assert!(s.view(6, 3).is_err());
/// ```
pub struct ByteString<'a> {
    repr: Repr<'a>,
}

impl<'a> ByteString<'a> {
    /// Copies `bytes` into a block from `alloc`
    pub fn copy_from(alloc: &'a dyn Allocator, bytes: &[u8]) -> Self {
        match alloc.allocate(bytes.len()) {
            Ok(ptr) => {
                // SAFETY: fresh block of `bytes.len()` bytes
                unsafe {
                    ptr.as_ptr()
                        .copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
                    Self::from_raw_parts(ptr, bytes.len(), alloc)
                }
            }
            Err(err) => Self::error(err.into()),
        }
    }

    /// Non-owning view over caller data
    pub const fn borrowed(bytes: &'a [u8]) -> Self {
        Self {
            repr: Repr::View(bytes),
        }
    }

    pub const fn error(err: ValueError) -> Self {
        Self {
            repr: Repr::Error(err),
        }
    }

    /// # Safety
    /// `ptr` must be a live block from `alloc` holding at least `len`
    /// initialized bytes; ownership moves into the string.
    pub(crate) unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize, alloc: &'a dyn Allocator) -> Self {
        Self {
            repr: Repr::Owned { ptr, len, alloc },
        }
    }

    /// Copies this string into `alloc`; errors carry over
    pub fn copy_in<'b>(&self, alloc: &'b dyn Allocator) -> ByteString<'b> {
        match self.as_bytes() {
            Some(bytes) => ByteString::copy_from(alloc, bytes),
            None => ByteString::error(self.err().unwrap_or(ValueError::Poisoned)),
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self.repr, Repr::Error(_))
    }

    /// The carried error, if any
    pub fn err(&self) -> Option<ValueError> {
        match self.repr {
            Repr::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the string borrows rather than owns its bytes
    pub fn is_view(&self) -> bool {
        matches!(self.repr, Repr::View(_))
    }

    /// The allocator owning the bytes, for owned strings
    pub fn allocator(&self) -> Option<&'a dyn Allocator> {
        match self.repr {
            Repr::Owned { alloc, .. } => Some(alloc),
            _ => None,
        }
    }

    /// Length in bytes; 0 for errors
    pub fn len(&self) -> usize {
        match self.repr {
            Repr::Owned { len, .. } => len,
            Repr::View(bytes) => bytes.len(),
            Repr::Error(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self.repr {
            // SAFETY: owned block holds `len` initialized bytes
            Repr::Owned { ptr, len, .. } => Some(unsafe { slice::from_raw_parts(ptr.as_ptr(), len) }),
            Repr::View(bytes) => Some(bytes),
            Repr::Error(_) => None,
        }
    }

    /// The bytes as UTF-8, when they are valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| core::str::from_utf8(b).ok())
    }

    /// Owned bytes for in-place edits; views become read-only errors
    fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match self.repr {
            // SAFETY: the string owns the block exclusively
            Repr::Owned { ptr, len, .. } => Some(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), len) }),
            Repr::View(_) => {
                self.repr = Repr::Error(ValueError::ReadOnly);
                None
            }
            Repr::Error(_) => None,
        }
    }

    // ------------------------------------------------------------------
    // Views and searching
    // ------------------------------------------------------------------

    /// Non-owning window over `start..end`
    ///
    /// Requires `start <= end <= len`; otherwise the result is an
    /// [`ValueError::OutOfBounds`] error string.
    pub fn view(&self, start: usize, end: usize) -> ByteString<'_> {
        let Some(bytes) = self.as_bytes() else {
            return ByteString::error(ValueError::Poisoned);
        };
        match bytes.get(start..end) {
            Some(window) => ByteString::borrowed(window),
            None => ByteString::error(ValueError::OutOfBounds {
                start,
                end,
                len: bytes.len(),
            }),
        }
    }

    /// Views between occurrences of `sep`
    pub fn split(&self, sep: u8) -> impl Iterator<Item = ByteString<'_>> {
        self.as_bytes()
            .into_iter()
            .flat_map(move |bytes| bytes.split(move |&b| b == sep))
            .map(ByteString::borrowed)
    }

    /// Occurrences of `byte`; 0 for errors
    pub fn count(&self, byte: u8) -> usize {
        self.as_bytes()
            .map_or(0, |bytes| bytes.iter().filter(|&&b| b == byte).count())
    }

    pub fn find(&self, byte: u8) -> Option<usize> {
        self.as_bytes()?.iter().position(|&b| b == byte)
    }

    pub fn rfind(&self, byte: u8) -> Option<usize> {
        self.as_bytes()?.iter().rposition(|&b| b == byte)
    }

    /// First index of `needle`; an empty needle matches at 0
    pub fn find_bytes(&self, needle: &[u8]) -> Option<usize> {
        find_subslice(self.as_bytes()?, needle, 0)
    }

    pub fn contains_bytes(&self, needle: &[u8]) -> bool {
        self.find_bytes(needle).is_some()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_bytes().is_some_and(|b| b.starts_with(prefix))
    }

    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.as_bytes().is_some_and(|b| b.ends_with(suffix))
    }

    /// Byte equality; false whenever either side is an error
    pub fn equals(&self, other: &ByteString<'_>) -> bool {
        match (self.as_bytes(), other.as_bytes()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // In-place edits
    // ------------------------------------------------------------------

    pub fn make_ascii_uppercase(&mut self) -> &mut Self {
        if let Some(bytes) = self.bytes_mut() {
            bytes.make_ascii_uppercase();
        }
        self
    }

    pub fn make_ascii_lowercase(&mut self) -> &mut Self {
        if let Some(bytes) = self.bytes_mut() {
            bytes.make_ascii_lowercase();
        }
        self
    }

    /// Replaces every `old` byte with `new`
    pub fn replace_byte(&mut self, old: u8, new: u8) -> &mut Self {
        if let Some(bytes) = self.bytes_mut() {
            for b in bytes.iter_mut().filter(|b| **b == old) {
                *b = new;
            }
        }
        self
    }

    pub fn reverse(&mut self) -> &mut Self {
        if let Some(bytes) = self.bytes_mut() {
            bytes.reverse();
        }
        self
    }

    // ------------------------------------------------------------------
    // Building new strings
    // ------------------------------------------------------------------

    /// Replaces every non-overlapping occurrence of `old` with `new`
    ///
    /// An empty `old` yields an unchanged copy. Any error input yields an
    /// error string.
    pub fn replace<'b>(
        &self,
        alloc: &'b dyn Allocator,
        old: &ByteString<'_>,
        new: &ByteString<'_>,
    ) -> ByteString<'b> {
        let (Some(haystack), Some(pattern), Some(replacement)) =
            (self.as_bytes(), old.as_bytes(), new.as_bytes())
        else {
            return ByteString::error(ValueError::Poisoned);
        };

        if pattern.is_empty() {
            return ByteString::copy_from(alloc, haystack);
        }

        let mut builder = ByteBuilder::with_capacity(alloc, haystack.len());
        let mut cursor = 0;
        while let Some(at) = find_subslice(haystack, pattern, cursor) {
            if builder.append(&haystack[cursor..at]).is_err()
                || builder.append(replacement).is_err()
            {
                return builder.finish();
            }
            cursor = at + pattern.len();
        }
        // A failed append poisons the builder, so finish reports it
        let _ = builder.append(&haystack[cursor..]);
        builder.finish()
    }

    /// Joins `parts` into a fresh string
    pub fn concat<'b>(alloc: &'b dyn Allocator, parts: &[&ByteString<'_>]) -> ByteString<'b> {
        let total = parts.iter().map(|p| p.len()).sum::<usize>();
        let mut builder = ByteBuilder::with_capacity(alloc, total);
        for part in parts {
            if builder.append_str(part).is_err() {
                break;
            }
        }
        builder.finish()
    }

    /// Releases the bytes through the producing allocator
    pub fn release(self) {
        drop(self);
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let tail = haystack.get(from..)?;
    if needle.is_empty() {
        return Some(from);
    }
    tail.windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}

impl Drop for ByteString<'_> {
    fn drop(&mut self) {
        if let Repr::Owned { ptr, alloc, .. } = self.repr {
            // Bump strategies take their space back on reset
            if alloc.strategy().supports_free() {
                // SAFETY: the string owns the block and never touches it again
                let _ = unsafe { alloc.deallocate(ptr) };
            }
        }
    }
}

impl Clone for ByteString<'_> {
    fn clone(&self) -> Self {
        match self.repr {
            Repr::Owned { alloc, .. } => {
                let bytes = self.as_bytes().unwrap_or_default();
                ByteString::copy_from(alloc, bytes)
            }
            Repr::View(bytes) => ByteString::borrowed(bytes),
            Repr::Error(err) => ByteString::error(err),
        }
    }
}

impl From<ValueError> for ByteString<'_> {
    fn from(err: ValueError) -> Self {
        Self::error(err)
    }
}

impl<'a> From<&'a str> for ByteString<'a> {
    fn from(s: &'a str) -> Self {
        Self::borrowed(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for ByteString<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::borrowed(bytes)
    }
}

// No `Eq`: an error never equals anything, itself included.
impl PartialEq<ByteString<'_>> for ByteString<'_> {
    fn eq(&self, other: &ByteString<'_>) -> bool {
        self.equals(other)
    }
}

impl PartialEq<[u8]> for ByteString<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == Some(other)
    }
}

impl PartialEq<str> for ByteString<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == Some(other.as_bytes())
    }
}

impl PartialEq<&str> for ByteString<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == Some(other.as_bytes())
    }
}

impl PartialEq<&[u8]> for ByteString<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == Some(*other)
    }
}

impl fmt::Debug for ByteString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.repr, self.as_bytes()) {
            (Repr::Error(err), _) => f.debug_tuple("Error").field(err).finish(),
            (Repr::View(_), Some(bytes)) => write!(f, "View(b\"{}\")", bytes.escape_ascii()),
            (_, Some(bytes)) => write!(f, "b\"{}\"", bytes.escape_ascii()),
            (_, None) => f.write_str("<empty>"),
        }
    }
}

impl fmt::Display for ByteString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(bytes) = self.as_bytes() else {
            return match self.err() {
                Some(err) => write!(f, "<error: {err}>"),
                None => Ok(()),
            };
        };
        for chunk in bytes.utf8_chunks() {
            f.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                f.write_str("\u{FFFD}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{PoolAllocator, TempAllocator};
    use crate::heap;

    #[test]
    fn copy_and_compare() {
        let s = ByteString::copy_from(heap(), b"Hello world!");
        assert_eq!(s.len(), 12);
        assert_eq!(s, "Hello world!");
        assert_eq!(s.as_str(), Some("Hello world!"));
        assert!(!s.is_view());
    }

    #[test]
    fn view_bounds() {
        let s = ByteString::borrowed(b"123456789");
        assert_eq!(s.view(3, 6), "456");
        assert_eq!(s.view(9, 9), "");
        assert_eq!(
            s.view(3, 10).err(),
            Some(ValueError::OutOfBounds {
                start: 3,
                end: 10,
                len: 9
            })
        );
        assert!(s.view(6, 3).is_err());
    }

    #[test]
    fn errors_never_compare_equal() {
        let a = ByteString::error(ValueError::Allocation);
        let b = ByteString::error(ValueError::Allocation);
        assert_ne!(a, b);
        assert!(!a.equals(&a));
        assert_ne!(a, "");
    }

    #[test]
    fn error_queries_are_empty() {
        let e = ByteString::error(ValueError::Poisoned);
        assert_eq!(e.len(), 0);
        assert_eq!(e.count(b'a'), 0);
        assert_eq!(e.find(b'a'), None);
        assert!(!e.contains_bytes(b""));
        assert_eq!(e.split(b',').count(), 0);
        assert!(e.view(0, 0).is_err());
    }

    #[test]
    fn searching() {
        let s = ByteString::borrowed(b"a,b,,c");
        assert_eq!(s.count(b','), 3);
        assert_eq!(s.find(b','), Some(1));
        assert_eq!(s.rfind(b','), Some(4));
        assert_eq!(s.find_bytes(b",,"), Some(3));
        assert_eq!(s.find_bytes(b""), Some(0));

        let parts: Vec<_> = s.split(b',').map(|p| p.to_string()).collect();
        assert_eq!(parts, ["a", "b", "", "c"]);
    }

    #[test]
    fn in_place_edits_chain() {
        let mut s = ByteString::copy_from(heap(), b"Hello world!");
        s.make_ascii_uppercase().replace_byte(b'O', b'0').reverse();
        assert_eq!(s, "!DLR0W 0LLEH");

        s.make_ascii_lowercase();
        assert_eq!(s, "!dlr0w 0lleh");
    }

    #[test]
    fn editing_a_view_poisons_it() {
        let mut s = ByteString::borrowed(b"abc");
        s.make_ascii_uppercase();
        assert_eq!(s.err(), Some(ValueError::ReadOnly));
    }

    #[test]
    fn replace_all_occurrences() {
        let s = ByteString::borrowed(b"one two one two one");
        let out = s.replace(heap(), &"one".into(), &"1".into());
        assert_eq!(out, "1 two 1 two 1");

        let unchanged = s.replace(heap(), &"".into(), &"x".into());
        assert_eq!(unchanged, "one two one two one");

        let poisoned = s.replace(heap(), &ByteString::error(ValueError::Allocation), &"x".into());
        assert_eq!(poisoned.err(), Some(ValueError::Poisoned));
    }

    #[test]
    fn concat_parts() {
        let hello = ByteString::borrowed(b"Hello ");
        let world = ByteString::copy_from(heap(), b"world!");
        let joined = ByteString::concat(heap(), &[&hello, &world]);
        assert_eq!(joined, "Hello world!");

        let bad = ByteString::error(ValueError::Overflow);
        assert!(ByteString::concat(heap(), &[&hello, &bad]).is_err());
    }

    #[test]
    fn copy_in_moves_between_allocators() {
        let temp = TempAllocator::with_capacity(256).expect("temp");
        let pool = PoolAllocator::new(heap(), 128).expect("pool");

        let s = ByteString::copy_from(&temp, b"move me");
        let t = s.copy_in(&pool);
        assert_eq!(t, s);
        assert_eq!(t.allocator().map(|a| a.signature()), Some(pool.signature()));
    }

    #[test]
    fn clone_uses_same_allocator() {
        let s = ByteString::copy_from(heap(), b"twice");
        let c = s.clone();
        assert_eq!(c, s);
        assert_ne!(c.as_bytes().map(<[u8]>::as_ptr), s.as_bytes().map(<[u8]>::as_ptr));
    }

    #[test]
    fn exhausted_allocator_gives_error_string() {
        let temp = TempAllocator::with_capacity(32).expect("temp");
        let s = ByteString::copy_from(&temp, &[0u8; 64]);
        assert_eq!(s.err(), Some(ValueError::Allocation));
    }

    #[test]
    fn display_and_debug() {
        let s = ByteString::borrowed(b"hi\n");
        assert_eq!(s.to_string(), "hi\n");
        assert_eq!(format!("{s:?}"), "View(b\"hi\\n\")");

        let e = ByteString::error(ValueError::ReadOnly);
        assert_eq!(e.to_string(), "<error: view is read-only>");
    }
}
