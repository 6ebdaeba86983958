//! Growable byte builder

use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr::NonNull;
use core::slice;

use super::ByteString;
use crate::allocator::Allocator;
use crate::error::ValueError;

/// Starting capacity of [`ByteBuilder::new`]
pub const DEFAULT_BUILDER_CAPACITY: usize = 64;

const MIN_BUILDER_CAPACITY: usize = 8;

/// Append-only byte buffer that finishes into a [`ByteString`]
///
/// Capacity doubles whenever an append does not fit. Any failure (allocation,
/// overflow, an error string appended) poisons the builder: later appends
/// return the stored error and [`finish`](Self::finish) yields an error
/// string.
///
/// # Examples
///
/// ```
/// use buddy_memory::string::ByteBuilder;
///
/// let mut builder = ByteBuilder::new(buddy_memory::heap());
/// builder.append(b"Hello ")?;
/// builder.append(b"world!")?;
/// assert_eq!(builder.finish(), "Hello world!");
/// # Ok::<(), buddy_memory::ValueError>(())
/// ```
pub struct ByteBuilder<'a> {
    alloc: &'a dyn Allocator,
    buf: Option<NonNull<u8>>,
    capacity: usize,
    len: usize,
    error: Option<ValueError>,
}

impl<'a> ByteBuilder<'a> {
    pub fn new(alloc: &'a dyn Allocator) -> Self {
        Self::with_capacity(alloc, DEFAULT_BUILDER_CAPACITY)
    }

    /// Starts with at least `capacity` bytes (minimum 8)
    pub fn with_capacity(alloc: &'a dyn Allocator, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUILDER_CAPACITY);
        match alloc.allocate(capacity) {
            Ok(buf) => Self {
                alloc,
                buf: Some(buf),
                capacity,
                len: 0,
                error: None,
            },
            Err(err) => Self {
                alloc,
                buf: None,
                capacity: 0,
                len: 0,
                error: Some(err.into()),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<ValueError> {
        self.error
    }

    /// Content so far; `None` once poisoned
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if self.error.is_some() {
            return None;
        }
        // SAFETY: `len` bytes are initialized
        self.buf
            .map(|buf| unsafe { slice::from_raw_parts(buf.as_ptr(), self.len) })
    }

    fn poison(&mut self, err: ValueError) -> ValueError {
        self.error = Some(err);
        err
    }

    fn reserve(&mut self, additional: usize) -> Result<NonNull<u8>, ValueError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let Some(buf) = self.buf else {
            return Err(self.poison(ValueError::Allocation));
        };
        let Some(needed) = self.len.checked_add(additional) else {
            return Err(self.poison(ValueError::Overflow));
        };
        if needed <= self.capacity {
            return Ok(buf);
        }

        let mut capacity = self.capacity;
        while capacity < needed {
            match capacity.checked_mul(2) {
                Some(next) => capacity = next,
                None => return Err(self.poison(ValueError::Overflow)),
            }
        }

        // SAFETY: `buf` is our live block from `alloc`
        match unsafe { self.alloc.reallocate(buf, capacity) } {
            Ok(grown) => {
                self.buf = Some(grown);
                self.capacity = capacity;
                Ok(grown)
            }
            Err(err) => Err(self.poison(err.into())),
        }
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<(), ValueError> {
        let buf = self.reserve(bytes.len())?;
        // SAFETY: reserve guaranteed room for `bytes.len()` more bytes
        unsafe {
            buf.as_ptr()
                .add(self.len)
                .copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
        }
        self.len += bytes.len();
        Ok(())
    }

    /// Appends a byte string; an error string poisons the builder
    pub fn append_str(&mut self, s: &ByteString<'_>) -> Result<(), ValueError> {
        match s.as_bytes() {
            Some(bytes) => self.append(bytes),
            None => match self.error {
                Some(err) => Err(err),
                None => Err(self.poison(ValueError::Poisoned)),
            },
        }
    }

    pub fn append_byte(&mut self, byte: u8) -> Result<(), ValueError> {
        self.append(&[byte])
    }

    /// Drops the content but keeps the buffer; poisoning is not cleared
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Hands the buffer over as the string's storage
    pub fn finish(self) -> ByteString<'a> {
        let mut this = ManuallyDrop::new(self);
        match (this.error, this.buf.take()) {
            (None, Some(buf)) => {
                // SAFETY: ownership of `buf` moves into the string
                unsafe { ByteString::from_raw_parts(buf, this.len, this.alloc) }
            }
            (err, buf) => {
                if let Some(buf) = buf {
                    // SAFETY: our block, never used again
                    let _ = unsafe { this.alloc.deallocate(buf) };
                }
                ByteString::error(err.unwrap_or(ValueError::Allocation))
            }
        }
    }
}

impl Drop for ByteBuilder<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            // SAFETY: our block, never used again
            let _ = unsafe { self.alloc.deallocate(buf) };
        }
    }
}

impl fmt::Write for ByteBuilder<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for ByteBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuilder")
            .field("allocator", &self.alloc.signature())
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("error", &self.error)
            .finish()
    }
}
