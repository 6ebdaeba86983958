//! # buddy-memory
//!
//! Pluggable allocators and byte strings that remember where they came from.
//!
//! One [`Allocator`](allocator::Allocator) trait, four strategies behind it:
//! - [`TempAllocator`](allocator::TempAllocator): fixed-capacity bump buffer
//!   with mark/restore/reset, plus a per-thread scratch instance
//! - [`Arena`](allocator::Arena): fixed region carved from another allocator
//!   and released in one call
//! - [`PoolAllocator`](allocator::PoolAllocator): bump region that grows by
//!   taking larger chunks
//! - [`HeapAllocator`](allocator::HeapAllocator): the host allocator
//!
//! Every block carries a 16-byte header naming the allocator instance that
//! produced it, so handing a block to the wrong allocator is caught.
//!
//! ## Quick Start
//!
//! ```rust
//! use buddy_memory::prelude::*;
//!
//! let mut temp = TempAllocator::with_capacity(4096)?;
//! {
//!     let mut builder = ByteBuilder::new(&temp);
//!     builder.append(b"Hello ")?;
//!     builder.append(b"world!")?;
//!     let s = builder.finish();
//!     assert_eq!(s, "Hello world!");
//!     assert_eq!(s.view(6, 11), "world");
//! }
//! temp.reset();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): allocator lifecycle and fatal errors through
//!   `tracing`

#![cfg_attr(docsrs, feature(doc_cfg))]
// Allocators are raw-pointer code by nature
#![allow(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::perf)]
#![warn(rust_2018_idioms)]
// `&self -> &mut [u8]` on bump allocators hands out disjoint reservations
#![allow(clippy::mut_from_ref)]
// Explicit lifetimes are clearer in allocator-bound types even when elidable
#![allow(clippy::elidable_lifetime_names)]
// Pointer casts between header and user data are reviewed per-site
#![allow(clippy::cast_ptr_alignment)]

#[macro_use]
mod macros;

// Error types
pub mod error;

// Core modules
pub mod allocator;
pub mod core;
pub mod string;
pub mod utils;

pub use crate::allocator::{AllocError, AllocResult};
pub use crate::error::{MemoryError, MemoryResult, Result, ValueError};

use crate::allocator::HeapAllocator;

static HEAP: HeapAllocator = HeapAllocator::new();

/// The process-wide heap allocator
///
/// ```
/// use buddy_memory::allocator::{Allocator, Strategy};
///
/// assert_eq!(buddy_memory::heap().strategy(), Strategy::Heap);
/// ```
#[inline]
pub fn heap() -> &'static HeapAllocator {
    &HEAP
}

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::core::traits::{MemoryUsage, Resettable};

    pub use crate::error::{MemoryError, MemoryResult, ValueError};

    pub use crate::allocator::scratch::{reset_temp, temp_scope, with_temp};
    pub use crate::allocator::{
        AllocError, AllocResult, Allocator, Arena, BumpConfig, HeapAllocator, Mark,
        PoolAllocator, PoolConfig, StatisticsProvider, Strategy, TempAllocator,
    };

    pub use crate::string::{ByteBuilder, ByteString};

    pub use crate::heap;
}
