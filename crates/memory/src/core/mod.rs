//! Core traits shared by every allocator

pub mod traits;

pub use traits::{BasicMemoryUsage, MemoryUsage, Resettable};
