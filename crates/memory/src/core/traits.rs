//! Core traits for memory management

use core::fmt;

/// Memory usage tracking trait
///
/// Implemented by every allocator in the crate. Capacity-bounded strategies
/// report what they still have on hand; the heap reports nothing.
pub trait MemoryUsage {
    /// Currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Available memory in bytes (if known)
    fn available_memory(&self) -> Option<usize>;

    /// Total memory capacity in bytes (if known)
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| self.used_memory() + available)
    }

    /// Memory usage as a percentage (0.0 to 100.0)
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }

    /// Checks if usage is at or above `threshold_percent`
    fn is_memory_pressure(&self, threshold_percent: f32) -> Option<bool> {
        self.memory_usage_percent()
            .map(|usage| usage >= threshold_percent)
    }

    fn memory_usage(&self) -> BasicMemoryUsage {
        BasicMemoryUsage {
            used: self.used_memory(),
            available: self.available_memory(),
            total: self.total_memory(),
            usage_percent: self.memory_usage_percent(),
        }
    }
}

/// Point-in-time usage report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMemoryUsage {
    pub used: usize,
    /// `None` when unbounded
    pub available: Option<usize>,
    /// `None` when unbounded
    pub total: Option<usize>,
    pub usage_percent: Option<f32>,
}

impl fmt::Display for BasicMemoryUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "used: {} bytes", self.used)?;

        if let Some(total) = self.total {
            write!(f, ", total: {total} bytes")?;
        }

        if let Some(percent) = self.usage_percent {
            write!(f, " ({percent:.1}%)")?;
        }

        Ok(())
    }
}

/// Allocators that can discard everything they handed out in one step
///
/// Taking `&mut self` means no block produced by the allocator can still be
/// borrowed when the reset happens.
pub trait Resettable {
    fn reset(&mut self);

    fn can_reset(&self) -> bool {
        true
    }
}
