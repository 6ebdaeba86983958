//! Allocator statistics tracking

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::format_bytes;

/// Snapshot of allocator statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Bytes currently handed out
    pub allocated_bytes: usize,
    /// Highest value `allocated_bytes` has reached
    pub peak_allocated_bytes: usize,
    /// Successful allocations
    pub allocation_count: usize,
    /// Successful reallocations
    pub reallocation_count: usize,
    /// Blocks released one by one
    pub deallocation_count: usize,
    /// Allocations and reallocations that failed
    pub failed_allocations: usize,
    /// Total bytes ever allocated
    pub total_bytes_allocated: usize,
    /// Bytes returned in bulk by restore, reset or growth bookkeeping
    pub released_bytes: usize,
    /// Number of bulk rewinds (restore or reset)
    pub rewind_count: usize,
}

impl AllocatorStats {
    pub const fn new() -> Self {
        Self {
            allocated_bytes: 0,
            peak_allocated_bytes: 0,
            allocation_count: 0,
            reallocation_count: 0,
            deallocation_count: 0,
            failed_allocations: 0,
            total_bytes_allocated: 0,
            released_bytes: 0,
            rewind_count: 0,
        }
    }

    /// Calculate the average allocation size
    pub fn average_allocation_size(&self) -> Option<f64> {
        if self.allocation_count > 0 {
            Some(self.total_bytes_allocated as f64 / self.allocation_count as f64)
        } else {
            None
        }
    }

    /// Fraction of allocation attempts that succeeded (0.0 to 1.0)
    pub fn allocation_efficiency(&self) -> f64 {
        let attempts = self.allocation_count + self.failed_allocations;
        if attempts > 0 {
            self.allocation_count as f64 / attempts as f64
        } else {
            1.0
        }
    }
}

/// One line, e.g. `live 1.0 KiB (peak 2.0 KiB), 10 allocs, 0 reallocs, ...`
impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "live {} (peak {}), {} allocs, {} reallocs, {} frees, {} failed",
            format_bytes(self.allocated_bytes),
            format_bytes(self.peak_allocated_bytes),
            self.allocation_count,
            self.reallocation_count,
            self.deallocation_count,
            self.failed_allocations,
        )?;
        if self.rewind_count > 0 {
            write!(
                f,
                ", {} rewound in {} steps",
                format_bytes(self.released_bytes),
                self.rewind_count
            )?;
        }
        if let Some(avg) = self.average_allocation_size() {
            write!(f, ", avg {avg:.1} B")?;
        }
        Ok(())
    }
}

/// Recorder behind [`AllocatorStats`]
#[derive(Debug, Default)]
pub struct AtomicAllocatorStats {
    allocated_bytes: AtomicUsize,
    peak_allocated_bytes: AtomicUsize,
    allocation_count: AtomicUsize,
    reallocation_count: AtomicUsize,
    deallocation_count: AtomicUsize,
    failed_allocations: AtomicUsize,
    total_bytes_allocated: AtomicUsize,
    released_bytes: AtomicUsize,
    rewind_count: AtomicUsize,
}

impl AtomicAllocatorStats {
    pub const fn new() -> Self {
        Self {
            allocated_bytes: AtomicUsize::new(0),
            peak_allocated_bytes: AtomicUsize::new(0),
            allocation_count: AtomicUsize::new(0),
            reallocation_count: AtomicUsize::new(0),
            deallocation_count: AtomicUsize::new(0),
            failed_allocations: AtomicUsize::new(0),
            total_bytes_allocated: AtomicUsize::new(0),
            released_bytes: AtomicUsize::new(0),
            rewind_count: AtomicUsize::new(0),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.allocated_bytes,
            &self.peak_allocated_bytes,
            &self.allocation_count,
            &self.reallocation_count,
            &self.deallocation_count,
            &self.failed_allocations,
            &self.total_bytes_allocated,
            &self.released_bytes,
            &self.rewind_count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn grow_allocated(&self, size: usize) {
        let now = self
            .allocated_bytes
            .fetch_add(size, Ordering::Relaxed)
            .saturating_add(size);
        self.peak_allocated_bytes.fetch_max(now, Ordering::Relaxed);
    }

    fn shrink_allocated(&self, size: usize) {
        let _ = self
            .allocated_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(size))
            });
    }

    pub fn record_allocation(&self, size: usize) {
        self.allocation_count.fetch_add(1, Ordering::Relaxed);
        self.total_bytes_allocated.fetch_add(size, Ordering::Relaxed);
        self.grow_allocated(size);
    }

    pub fn record_reallocation(&self, old_size: usize, new_size: usize) {
        self.reallocation_count.fetch_add(1, Ordering::Relaxed);
        if new_size > old_size {
            let diff = new_size - old_size;
            self.total_bytes_allocated.fetch_add(diff, Ordering::Relaxed);
            self.grow_allocated(diff);
        } else {
            self.shrink_allocated(old_size - new_size);
        }
    }

    pub fn record_deallocation(&self, size: usize) {
        self.deallocation_count.fetch_add(1, Ordering::Relaxed);
        self.shrink_allocated(size);
    }

    pub fn record_allocation_failure(&self) {
        self.failed_allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a bulk rewind that returned `bytes` of region space
    pub fn record_release(&self, bytes: usize) {
        self.rewind_count.fetch_add(1, Ordering::Relaxed);
        self.released_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.shrink_allocated(bytes);
    }

    pub fn snapshot(&self) -> AllocatorStats {
        AllocatorStats {
            allocated_bytes: self.allocated_bytes.load(Ordering::Relaxed),
            peak_allocated_bytes: self.peak_allocated_bytes.load(Ordering::Relaxed),
            allocation_count: self.allocation_count.load(Ordering::Relaxed),
            reallocation_count: self.reallocation_count.load(Ordering::Relaxed),
            deallocation_count: self.deallocation_count.load(Ordering::Relaxed),
            failed_allocations: self.failed_allocations.load(Ordering::Relaxed),
            total_bytes_allocated: self.total_bytes_allocated.load(Ordering::Relaxed),
            released_bytes: self.released_bytes.load(Ordering::Relaxed),
            rewind_count: self.rewind_count.load(Ordering::Relaxed),
        }
    }
}

/// Trait for allocators that support statistics collection
pub trait StatisticsProvider {
    /// Current statistics, zeroed when tracking is off
    fn statistics(&self) -> AllocatorStats;

    fn reset_statistics(&self);

    fn statistics_enabled(&self) -> bool {
        true
    }
}

/// Statistics that can be switched off by configuration
#[derive(Debug)]
pub struct OptionalStats {
    stats: Option<AtomicAllocatorStats>,
}

impl OptionalStats {
    pub const fn enabled() -> Self {
        Self {
            stats: Some(AtomicAllocatorStats::new()),
        }
    }

    pub const fn disabled() -> Self {
        Self { stats: None }
    }

    pub const fn new(track: bool) -> Self {
        if track {
            Self::enabled()
        } else {
            Self::disabled()
        }
    }

    #[inline]
    pub fn record_allocation(&self, size: usize) {
        if let Some(ref stats) = self.stats {
            stats.record_allocation(size);
        }
    }

    #[inline]
    pub fn record_reallocation(&self, old_size: usize, new_size: usize) {
        if let Some(ref stats) = self.stats {
            stats.record_reallocation(old_size, new_size);
        }
    }

    #[inline]
    pub fn record_deallocation(&self, size: usize) {
        if let Some(ref stats) = self.stats {
            stats.record_deallocation(size);
        }
    }

    #[inline]
    pub fn record_allocation_failure(&self) {
        if let Some(ref stats) = self.stats {
            stats.record_allocation_failure();
        }
    }

    #[inline]
    pub fn record_release(&self, bytes: usize) {
        if let Some(ref stats) = self.stats {
            stats.record_release(bytes);
        }
    }

    pub fn snapshot(&self) -> Option<AllocatorStats> {
        self.stats.as_ref().map(AtomicAllocatorStats::snapshot)
    }

    pub fn reset(&self) {
        if let Some(ref stats) = self.stats {
            stats.reset();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.stats.is_some()
    }
}
