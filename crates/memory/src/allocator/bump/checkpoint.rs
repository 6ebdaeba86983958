//! Marks and scoping support for bump allocators

use core::ops::{Deref, DerefMut};

use super::TempAllocator;
use crate::allocator::header::Signature;

/// Saved bump position
///
/// Valid only for the allocator that produced it, and only until that
/// allocator is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub(super) owner: Signature,
    pub(super) offset: usize,
    pub(super) generation: u32,
}

impl Mark {
    /// Allocator instance this mark belongs to
    pub fn owner(&self) -> Signature {
        self.owner
    }

    /// Bump offset at the time the mark was taken
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// RAII guard that restores a [`TempAllocator`] on drop
///
/// Dereferences to the allocator, so it can be used (and nested) in its
/// place. If the allocator was reset or rewound past the guard's mark while
/// the guard was alive, the restore is skipped.
pub struct TempScope<'a> {
    allocator: &'a mut TempAllocator,
    mark: Mark,
}

impl<'a> TempScope<'a> {
    pub(super) fn new(allocator: &'a mut TempAllocator) -> Self {
        Self {
            mark: allocator.mark(),
            allocator,
        }
    }

    /// The mark restored on drop
    pub fn mark(&self) -> Mark {
        self.mark
    }
}

impl Deref for TempScope<'_> {
    type Target = TempAllocator;

    fn deref(&self) -> &TempAllocator {
        self.allocator
    }
}

impl DerefMut for TempScope<'_> {
    fn deref_mut(&mut self) -> &mut TempAllocator {
        self.allocator
    }
}

impl Drop for TempScope<'_> {
    fn drop(&mut self) {
        if self.allocator.core().accepts(self.mark) {
            self.allocator.restore(self.mark);
        }
    }
}
