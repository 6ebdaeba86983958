//! Sealing for [`Allocator`](super::Allocator)
//!
//! `Sealed` is public but lives in a private module, so downstream crates can
//! name `Allocator` as a bound or a trait object without implementing it.

pub trait Sealed {}

impl Sealed for super::TempAllocator {}
impl Sealed for super::Arena<'_> {}
impl Sealed for super::PoolAllocator<'_> {}
impl Sealed for super::HeapAllocator {}
