//! Error types for transient resource management.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors reported by the fence, the circular heap and the descriptor cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientError {
    /// Creating a fence, event or the initial heap failed. Setup must abort.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// A configuration or call parameter is invalid.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The request can never be satisfied by a single block.
    #[error("allocation of {size} bytes (alignment {alignment}) does not fit a {block_size} byte block")]
    AllocationTooLarge {
        /// Requested size in bytes.
        size: u64,
        /// Requested alignment in bytes.
        alignment: u64,
        /// Block size of the heap.
        block_size: u64,
    },
    /// The backend could not provide more memory for a block or sub-heap.
    ///
    /// The caller can force a GPU sync and retry, or fail the frame.
    #[error("GPU resources exhausted: {0}")]
    ResourceExhausted(String),
    /// The GPU device was lost.
    #[error("GPU device lost")]
    DeviceLost,
    /// Any other backend failure.
    #[error(transparent)]
    Backend(BackendError),
}

impl From<BackendError> for TransientError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::OutOfMemory => Self::ResourceExhausted(err.to_string()),
            BackendError::DeviceLost => Self::DeviceLost,
            other => Self::Backend(other),
        }
    }
}
