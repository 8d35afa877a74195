//! Core types for the Tessera entity storage framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the generational [`Handle`] encoding shared by every storage layer,
//! registration-time component type identity, and the error types those
//! pieces report.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handle;
pub mod registry;

pub use error::{HandleError, RegistryError};
pub use handle::{DefaultHandle, GenerationalHandle, Handle, HandleBits};
pub use registry::{ComponentTypeId, TypeRegistry};
