//! # Memory Error Types
//!
//! All errors that can occur in the memory substrate.

use thiserror::Error;

/// Errors that can occur in the memory substrate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// An allocation did not fit in the backing reservation.
    ///
    /// This is fatal for the arena that reported it, but recoverable at the
    /// application level by creating a larger reservation.
    #[error("allocation of {requested} bytes exceeds remaining capacity ({allocated} of {capacity} allocated)")]
    OutOfCapacity {
        /// The size of the failed allocation in bytes.
        requested: usize,
        /// Bytes already allocated when the request was made.
        allocated: usize,
        /// Total capacity of the backing reservation.
        capacity: usize,
    },
}

/// Result type for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
