//! Storage configuration parameters.

use crate::error::StorageError;

/// Configuration shared by [`PagedVec`](crate::PagedVec),
/// [`SparseFreeList`](crate::SparseFreeList) and
/// [`HandleFactory`](crate::HandleFactory).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Number of elements per page.
    ///
    /// Default: 4096. Must be a power of two and at most
    /// [`MAX_PAGE_SIZE`](Self::MAX_PAGE_SIZE).
    pub page_size: usize,

    /// Pages allocated up front by containers built from this config.
    ///
    /// Default: 0 (every page is allocated on first use).
    pub initial_pages: usize,
}

impl StorageConfig {
    /// Default page size in elements.
    pub const DEFAULT_PAGE_SIZE: usize = 4096;

    /// Largest accepted page size. Free-list slot links are stored as
    /// `u32` with two reserved sentinels.
    pub const MAX_PAGE_SIZE: usize = 1 << 31;

    /// Create a config with the given page size and no initial pages.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            initial_pages: 0,
        }
    }

    /// Reserve `pages` pages at construction.
    pub fn with_initial_pages(mut self, pages: usize) -> Self {
        self.initial_pages = pages;
        self
    }

    /// Check the invariants listed on each field.
    pub fn validate(&self) -> Result<(), StorageError> {
        if !self.page_size.is_power_of_two() {
            return Err(StorageError::InvalidConfig {
                reason: format!("page_size {} is not a power of two", self.page_size),
            });
        }
        if self.page_size > Self::MAX_PAGE_SIZE {
            return Err(StorageError::InvalidConfig {
                reason: format!(
                    "page_size {} exceeds maximum {}",
                    self.page_size,
                    Self::MAX_PAGE_SIZE
                ),
            });
        }
        Ok(())
    }

    /// `log2(page_size)`. Only meaningful on a validated config.
    pub(crate) fn page_shift(&self) -> u32 {
        self.page_size.trailing_zeros()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}
