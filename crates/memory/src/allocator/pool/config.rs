//! Pool allocator configuration

use crate::error::{MemoryError, MemoryResult};

/// Configuration for pool allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Size of the first chunk in bytes
    pub initial_capacity: usize,

    /// Chunk capacity multiplier applied on each growth step
    pub growth_factor: usize,

    /// Upper bound for a single chunk; `None` means unbounded
    pub max_capacity: Option<usize>,

    /// Fill pattern byte for newly allocated memory (for debugging)
    pub alloc_pattern: Option<u8>,

    /// Enable statistics tracking
    pub track_stats: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 4096,
            growth_factor: 2,
            max_capacity: None,
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            track_stats: cfg!(debug_assertions),
        }
    }
}

impl PoolConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            alloc_pattern: None,
            track_stats: false,
            ..Self::default()
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            alloc_pattern: Some(0xBB),
            track_stats: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor;
        self
    }

    #[must_use]
    pub fn with_max_capacity(mut self, max: usize) -> Self {
        self.max_capacity = Some(max);
        self
    }

    #[must_use]
    pub fn with_stats(mut self, track_stats: bool) -> Self {
        self.track_stats = track_stats;
        self
    }

    pub fn validate(&self) -> MemoryResult<()> {
        if self.initial_capacity == 0 {
            return Err(MemoryError::invalid_config(
                "pool initial capacity must be non-zero",
            ));
        }
        if self.growth_factor < 2 {
            return Err(MemoryError::invalid_config(
                "pool growth factor must be at least 2",
            ));
        }
        if let Some(max) = self.max_capacity {
            if max < self.initial_capacity {
                return Err(MemoryError::invalid_config(
                    "pool max capacity is below the initial capacity",
                ));
            }
        }
        Ok(())
    }
}
