//! Utility functions and helpers for buddy-memory
//!
//! Alignment helpers and checked size arithmetic shared by the allocators.

use crate::error::{AllocError, AllocResult};

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use buddy_memory::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Checks if a value is aligned to the given alignment
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Overflow-checked [`align_up`]
#[inline]
pub fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    value
        .checked_add(alignment - 1)
        .map(|v| v & !(alignment - 1))
}

/// Adds two sizes, reporting overflow as a [`AllocError::SizeOverflow`]
#[inline]
pub fn checked_add(a: usize, b: usize, operation: &'static str) -> AllocResult<usize> {
    a.checked_add(b)
        .ok_or_else(|| AllocError::size_overflow(operation))
}

/// Multiplies two sizes, reporting overflow as a [`AllocError::SizeOverflow`]
#[inline]
pub fn checked_mul(a: usize, b: usize, operation: &'static str) -> AllocResult<usize> {
    a.checked_mul(b)
        .ok_or_else(|| AllocError::size_overflow(operation))
}

/// Formats a byte count using binary units
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(100, 8), 104);
        assert!(is_aligned(104, 8));
        assert!(!is_aligned(100, 8));
    }

    #[test]
    fn test_checked_helpers() {
        assert_eq!(checked_align_up(usize::MAX, 8), None);
        assert_eq!(checked_align_up(13, 8), Some(16));
        assert!(checked_add(usize::MAX, 1, "test").is_err());
        assert_eq!(checked_mul(64, 2, "test").ok(), Some(128));
        assert!(checked_mul(usize::MAX, 2, "test").is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(8 * 1024 * 1024), "8.0 MiB");
    }
}
