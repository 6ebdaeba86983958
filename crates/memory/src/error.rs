//! Error types for buddy-memory
//!
//! Three kinds of failure are kept apart:
//! - [`MemoryError`]: recoverable allocator failures (exhaustion, host OOM,
//!   bad configuration, unsupported operation).
//! - [`ValueError`]: value-level errors carried inside a
//!   [`ByteString`](crate::string::ByteString) or
//!   [`ByteBuilder`](crate::string::ByteBuilder) so later operations can
//!   short-circuit instead of failing loudly.
//! - Programmer errors (foreign blocks, stale marks, shrinking a pool block)
//!   never become values; they go through [`fatal`] and abort the caller.

use core::fmt;
use std::io::Write;

use thiserror::Error;

use crate::allocator::Strategy;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Allocator Errors
// ============================================================================

/// Recoverable allocator errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation Errors ---
    #[error("Memory allocation failed: {size} bytes")]
    AllocationFailed { size: usize },

    #[error("{strategy} exhausted: requested {requested} bytes, available {available}")]
    Exhausted {
        strategy: Strategy,
        requested: usize,
        available: usize,
    },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: &'static str },

    // --- Pool Errors ---
    #[error("Pool growth to {requested} bytes exceeds maximum capacity {max_capacity}")]
    GrowthLimit {
        requested: usize,
        max_capacity: usize,
    },

    // --- Configuration Errors ---
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- Feature Support Errors ---
    #[error("Operation not supported: {operation} on {strategy}")]
    NotSupported {
        operation: &'static str,
        strategy: Strategy,
    },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Exhaustion clears once the owning region is reset or restored.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::GrowthLimit { .. })
    }

    /// Returns `true` for the "discrete release unsupported" signal
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "MEM:ALLOC:FAILED",
            Self::Exhausted {
                strategy: Strategy::Temporary,
                ..
            } => "MEM:TEMP:EXHAUSTED",
            Self::Exhausted {
                strategy: Strategy::Arena,
                ..
            } => "MEM:ARENA:EXHAUSTED",
            Self::Exhausted {
                strategy: Strategy::Pool,
                ..
            } => "MEM:POOL:EXHAUSTED",
            Self::Exhausted {
                strategy: Strategy::Heap,
                ..
            } => "MEM:HEAP:EXHAUSTED",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::GrowthLimit { .. } => "MEM:POOL:LIMIT",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::NotSupported { .. } => "MEM:FEATURE:UNSUPPORTED",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create allocation failed error
    pub fn allocation_failed(size: usize) -> Self {
        #[cfg(feature = "logging")]
        error!("Memory allocation failed: {} bytes", size);

        Self::AllocationFailed { size }
    }

    /// Create exhaustion error for a bump region
    pub fn exhausted(strategy: Strategy, requested: usize, available: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(
            "{} exhausted: requested {} bytes, {} available",
            strategy, requested, available
        );

        Self::Exhausted {
            strategy,
            requested,
            available,
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &'static str) -> Self {
        Self::SizeOverflow { operation }
    }

    /// Create pool growth limit error
    pub fn growth_limit(requested: usize, max_capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(
            "Pool growth refused: {} bytes requested, limit {}",
            requested, max_capacity
        );

        Self::GrowthLimit {
            requested,
            max_capacity,
        }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create not supported error
    pub fn not_supported(operation: &'static str, strategy: Strategy) -> Self {
        Self::NotSupported {
            operation,
            strategy,
        }
    }
}

// ============================================================================
// Value Errors
// ============================================================================

/// Errors carried by byte strings and builders
///
/// These are expected outcomes, not bugs: once a value holds one, further
/// operations propagate it instead of touching the data.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    #[error("allocation failed")]
    Allocation,

    #[error("range {start}..{end} out of bounds for length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("input carried an error")]
    Poisoned,

    #[error("view is read-only")]
    ReadOnly,

    #[error("length overflow")]
    Overflow,
}

impl From<MemoryError> for ValueError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::SizeOverflow { .. } => Self::Overflow,
            _ => Self::Allocation,
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

/// Type aliases for allocator module
pub type AllocError = MemoryError;
pub type AllocResult<T> = MemoryResult<T>;

// ============================================================================
// Fatal Errors
// ============================================================================

/// Reports a programmer error and never returns
///
/// Logs the message, flushes buffered output, then panics. With
/// `panic = "abort"` (the release profile) this terminates the process.
#[cold]
#[track_caller]
pub fn fatal(args: fmt::Arguments<'_>) -> ! {
    #[cfg(feature = "logging")]
    error!(target: "buddy_memory", "fatal: {}", args);

    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    panic!("buddy: {args}");
}

// ============================================================================
// Tests
// ============================================================================
