//! Storage-layer error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during storage operations.
///
/// `OutOfRange` is a recoverable range error. The remaining variants are
/// caller contract violations; the structure is left untouched when one
/// is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// A checked accessor was given a position past the end.
    OutOfRange {
        /// The rejected position.
        index: usize,
        /// Number of elements at the time of the call.
        len: usize,
    },
    /// Popped or peeked an empty free list.
    EmptyFreeList,
    /// Destroyed a handle that is stale or already freed.
    NotAlive {
        /// Index carried by the handle.
        index: usize,
        /// Version carried by the handle.
        version: u64,
    },
    /// No index is left in the handle's value field.
    IndexSpaceExhausted {
        /// Largest index the handle type can carry.
        max: usize,
    },
    /// A [`StorageConfig`](crate::StorageConfig) failed validation.
    InvalidConfig {
        /// What was wrong with it.
        reason: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::EmptyFreeList => write!(f, "free list is empty"),
            Self::NotAlive { index, version } => {
                write!(f, "handle {index}v{version} is not alive")
            }
            Self::IndexSpaceExhausted { max } => {
                write!(f, "handle index space exhausted (max index {max})")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid storage config: {reason}"),
        }
    }
}

impl Error for StorageError {}
