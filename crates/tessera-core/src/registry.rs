//! Registration-time identity for component types.
//!
//! Every distinct component type is registered under a developer-chosen
//! key and receives a sequential [`ComponentTypeId`]. Identifiers are
//! stable for the lifetime of the registry and never derived from
//! compiler-specific type names.

use std::fmt;

use indexmap::IndexSet;

use crate::error::RegistryError;

/// Identifies a registered component type.
///
/// `ComponentTypeId(n)` is the n-th key registered with its
/// [`TypeRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u32);

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ComponentTypeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Maps component keys to sequential [`ComponentTypeId`]s.
///
/// Insertion order is preserved, so the id of a key is its position in
/// registration order.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    names: IndexSet<String>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning its id. Registering an existing key
    /// returns the id it already has.
    pub fn register(&mut self, name: impl Into<String>) -> Result<ComponentTypeId, RegistryError> {
        let name = name.into();
        if let Some(index) = self.names.get_index_of(&name) {
            return Ok(ComponentTypeId(index as u32));
        }
        self.insert_new(name)
    }

    /// Register `name`, failing if the key is already present.
    pub fn try_register_unique(
        &mut self,
        name: impl Into<String>,
    ) -> Result<ComponentTypeId, RegistryError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        self.insert_new(name)
    }

    /// Look up the id registered for `name`.
    pub fn id_of(&self, name: &str) -> Option<ComponentTypeId> {
        self.names
            .get_index_of(name)
            .map(|index| ComponentTypeId(index as u32))
    }

    /// Look up the key registered under `id`.
    pub fn name_of(&self, id: ComponentTypeId) -> Option<&str> {
        self.names.get_index(id.0 as usize).map(String::as_str)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no type has been registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(id, key)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentTypeId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (ComponentTypeId(index as u32), name.as_str()))
    }

    fn insert_new(&mut self, name: String) -> Result<ComponentTypeId, RegistryError> {
        let next = u32::try_from(self.names.len()).map_err(|_| RegistryError::Exhausted)?;
        self.names.insert(name);
        Ok(ComponentTypeId(next))
    }
}
