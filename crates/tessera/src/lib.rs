//! Tessera: paged storage and generational handles for entity-component
//! systems.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Tessera sub-crates. For most users, adding `tessera` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! let config = StorageConfig::new(4);
//! let mut entities: HandleFactory<Handle<u32, 4>> = HandleFactory::with_config(&config).unwrap();
//!
//! let handles: Vec<_> = (0..4).map(|_| entities.create().unwrap()).collect();
//! entities.destroy(handles[1]).unwrap();
//!
//! // The freed slot comes back one generation later.
//! let reused = entities.create().unwrap();
//! assert_eq!((reused.index(), reused.version()), (1, 1));
//! assert!(!entities.alive(handles[1]));
//!
//! // Component data lives in a paged container indexed by handle.
//! let mut positions: PagedVec<(f32, f32)> = PagedVec::with_config(&config).unwrap();
//! positions.resize(entities.capacity(), (0.0, 0.0));
//! positions[reused.index()] = (1.0, 2.0);
//! assert_eq!(positions.swap_remove(0), (0.0, 0.0));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | Handle encoding, type registry, core errors |
//! | [`storage`] | `tessera-storage` | Paged container, free list, handle factory |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handle encoding, component type identity and errors (`tessera-core`).
///
/// [`types::Handle`] packs an index and a version into one integer;
/// [`types::TypeRegistry`] assigns [`types::ComponentTypeId`]s by name.
pub use tessera_core as types;

/// Paged storage and handle allocation (`tessera-storage`).
///
/// [`storage::PagedVec`] keeps element addresses stable while it grows,
/// [`storage::SparseFreeList`] tracks reclaimed indices by page and
/// [`storage::HandleFactory`] hands out generational handles on top of
/// both.
pub use tessera_storage as storage;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Handles and identity
    pub use tessera_core::{ComponentTypeId, DefaultHandle, GenerationalHandle, Handle, TypeRegistry};

    // Storage
    pub use tessera_storage::{
        Cursor, ErasePolicy, HandleFactory, LifecycleObserver, Optimal, PagedVec, SparseFreeList,
        StorageConfig, Strict,
    };

    // Errors
    pub use tessera_core::{HandleError, RegistryError};
    pub use tessera_storage::StorageError;
}
