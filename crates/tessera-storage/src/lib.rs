//! Paged storage and handle management for Tessera.
//!
//! Provides the storage layer that component pools and entity registries
//! are built on. Everything here is single-writer: callers that share an
//! instance across threads supply their own locking.
//!
//! # Architecture
//!
//! ```text
//! HandleFactory (create / destroy / alive)
//! ├── PagedVec<H>    one stored handle per slot, carrying its current version
//! │   └── Vec<Vec<T>> page directory; each page allocated once at page_size
//! └── SparseFreeList reclaimed indices, grouped by page
//!     └── FreePage[]  intra-page chain + inter-page most-recently-touched list
//! ```
//!
//! # Address stability
//!
//! A page is allocated with its full capacity and never grows, so growing
//! the container only appends pages to the directory. References into
//! existing pages stay valid until the element is erased or its page is
//! released by [`PagedVec::shrink_to_fit`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod factory;
pub mod free_list;
pub mod iter;
pub mod paged;
pub mod policy;

// Public re-exports for the primary API surface.
pub use config::StorageConfig;
pub use cursor::Cursor;
pub use error::StorageError;
pub use factory::{HandleFactory, LifecycleObserver};
pub use free_list::SparseFreeList;
pub use paged::PagedVec;
pub use policy::{ErasePolicy, Optimal, Strict};
