//! Allocators
//!
//! One polymorphic [`Allocator`] trait and four strategies behind it:
//! temporary (bump with mark/restore), arena, pool and heap.

// Core allocator types
pub mod header;
mod sealed;
mod stats;
mod traits;

// Allocator implementations
pub mod arena;
pub mod bump;
pub mod heap;
pub mod pool;

// Re-exports for convenience
pub use arena::Arena;
pub use bump::{BumpConfig, Mark, TEMP_ALLOC_BUFSIZE, TempAllocator, TempScope, scratch};
pub use header::{BLOCK_ALIGN, BlockHeader, HEADER_SIZE, Signature};
pub use heap::HeapAllocator;
pub use pool::{PoolAllocator, PoolConfig};

pub use crate::core::{BasicMemoryUsage, MemoryUsage, Resettable};
pub use crate::error::{AllocError, AllocResult};
pub use stats::{AllocatorStats, AtomicAllocatorStats, OptionalStats, StatisticsProvider};
pub use traits::{Allocator, Strategy};
