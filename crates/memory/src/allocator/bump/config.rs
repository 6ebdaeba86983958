//! Bump region configuration

use crate::error::{MemoryError, MemoryResult};

/// Default capacity of a temporary allocator (8 MiB)
pub const TEMP_ALLOC_BUFSIZE: usize = 8 * 1024 * 1024;

/// Configuration shared by [`TempAllocator`](super::TempAllocator) and
/// [`Arena`](crate::allocator::Arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpConfig {
    /// Region size in bytes
    pub capacity: usize,

    /// Fill pattern byte for newly allocated memory (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for memory returned by restore/reset (for debugging)
    pub dealloc_pattern: Option<u8>,

    /// Enable statistics tracking
    pub track_stats: bool,
}

impl Default for BumpConfig {
    fn default() -> Self {
        Self {
            capacity: TEMP_ALLOC_BUFSIZE,
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
            track_stats: cfg!(debug_assertions),
        }
    }
}

impl BumpConfig {
    /// Production configuration - no fill patterns, no stats
    #[must_use]
    pub fn production() -> Self {
        Self {
            capacity: TEMP_ALLOC_BUFSIZE,
            alloc_pattern: None,
            dealloc_pattern: None,
            track_stats: false,
        }
    }

    /// Debug configuration - poison patterns and full stats
    #[must_use]
    pub fn debug() -> Self {
        Self {
            capacity: TEMP_ALLOC_BUFSIZE,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
            track_stats: true,
        }
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_stats(mut self, track_stats: bool) -> Self {
        self.track_stats = track_stats;
        self
    }

    #[must_use]
    pub fn with_patterns(mut self, alloc: Option<u8>, dealloc: Option<u8>) -> Self {
        self.alloc_pattern = alloc;
        self.dealloc_pattern = dealloc;
        self
    }

    pub fn validate(&self) -> MemoryResult<()> {
        if self.capacity == 0 {
            return Err(MemoryError::invalid_config("bump capacity must be non-zero"));
        }
        if self.capacity > isize::MAX as usize {
            return Err(MemoryError::invalid_config("bump capacity exceeds isize::MAX"));
        }
        Ok(())
    }
}
