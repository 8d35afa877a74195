//! Error types for handle encoding and type registration.

use std::error::Error;
use std::fmt;

/// Errors from the checked handle constructor.
///
/// The unchecked [`Handle::new`](crate::Handle::new) truncates instead of
/// failing; these are only reported by
/// [`Handle::try_new`](crate::Handle::try_new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleError {
    /// The index does not fit in the handle's value field, or collides
    /// with the tombstone pattern.
    IndexOverflow {
        /// The rejected index.
        index: usize,
        /// Largest index the value field can carry.
        max: usize,
    },
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOverflow { index, max } => {
                write!(f, "handle index {index} exceeds value field (max {max})")
            }
        }
    }
}

impl Error for HandleError {}

/// Errors from [`TypeRegistry`](crate::TypeRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A key was registered twice through the unique path.
    DuplicateName {
        /// The key that was already present.
        name: String,
    },
    /// Every `u32` identifier has been handed out.
    Exhausted,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => {
                write!(f, "component type '{name}' is already registered")
            }
            Self::Exhausted => write!(f, "component type identifiers exhausted"),
        }
    }
}

impl Error for RegistryError {}
