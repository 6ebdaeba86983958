//! Per-thread scratch allocator
//!
//! Each thread owns one lazily created [`TempAllocator`]. It is reached only
//! through closures, so its borrows cannot escape; calling back into this
//! module from inside one of those closures is a programmer error.

use std::cell::RefCell;

use super::{BumpConfig, TempAllocator};
use crate::error::AllocResult;

thread_local! {
    static SCRATCH: RefCell<Option<TempAllocator>> = const { RefCell::new(None) };
}

#[track_caller]
fn with_slot<R>(f: impl FnOnce(&mut Option<TempAllocator>) -> R) -> R {
    SCRATCH.with(|cell| {
        let Ok(mut slot) = cell.try_borrow_mut() else {
            fatal!("re-entrant access to the thread's scratch allocator");
        };
        f(&mut slot)
    })
}

/// Runs `f` with the thread's scratch allocator, creating it on first use
pub fn with_temp<R>(f: impl FnOnce(&mut TempAllocator) -> R) -> AllocResult<R> {
    with_slot(|slot| {
        let temp = match slot.take() {
            Some(temp) => temp,
            None => TempAllocator::new()?,
        };
        Ok(f(slot.insert(temp)))
    })
}

/// Runs `f` and then rewinds the scratch allocator to where it was
///
/// # Examples
///
/// ```
/// use buddy_memory::allocator::scratch::temp_scope;
/// use buddy_memory::string::ByteString;
///
/// let len = temp_scope(|temp| {
///     let s = ByteString::copy_from(temp, b"scratch");
///     s.len()
/// })?;
/// assert_eq!(len, 7);
/// # Ok::<(), buddy_memory::MemoryError>(())
/// ```
pub fn temp_scope<R>(f: impl FnOnce(&TempAllocator) -> R) -> AllocResult<R> {
    with_temp(|temp| {
        let scope = temp.scope();
        f(&scope)
    })
}

/// Resets the scratch allocator, if it exists
pub fn reset_temp() {
    with_slot(|slot| {
        if let Some(temp) = slot {
            temp.reset();
        }
    });
}

/// Replaces the scratch allocator with one built from `config`
pub fn install_temp(config: BumpConfig) -> AllocResult<()> {
    let temp = TempAllocator::with_config(config)?;
    with_slot(|slot| {
        *slot = Some(temp);
    });
    Ok(())
}

/// Capacity, used bytes and generation of the scratch allocator, if created
pub fn temp_usage() -> Option<(usize, usize, u32)> {
    with_slot(|slot| {
        slot.as_ref()
            .map(|temp| (temp.capacity(), temp.used(), temp.generation()))
    })
}
