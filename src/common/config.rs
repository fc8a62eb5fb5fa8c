//! Configuration constants and index options.

use crate::common::{Error, Result};
use crate::index::btree::{MAX_INTERNAL_CAPACITY, MAX_LEAF_CAPACITY};

/// Size of a page in bytes (4KB).
///
/// # Memory Layout
/// With 4KB pages and 32-bit PageIds:
/// - Max pages: 2^32 = 4,294,967,296 pages
/// - Max index size: 4,294,967,296 × 4KB = 16TB
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages with u32 PageId.
pub const MAX_PAGES: u64 = (u32::MAX as u64) + 1;

/// Maximum theoretical index file size in bytes.
pub const MAX_DB_SIZE_BYTES: u64 = MAX_PAGES * PAGE_SIZE as u64;

/// Smallest node capacity that still lets a split leave both halves non-empty.
pub const MIN_NODE_CAPACITY: usize = 2;

/// Options used when opening or creating an index.
///
/// Node capacities only apply to a brand-new index. Once the first page is
/// written the capacities are persisted in the tree metadata and those values
/// win on every later open.
///
/// # Example
/// ```
/// use treeindex::IndexOptions;
///
/// let options = IndexOptions::new()
///     .with_leaf_capacity(3)
///     .with_internal_capacity(3)
///     .with_sync_writes(false);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Maximum number of entries in a leaf node.
    pub leaf_capacity: usize,

    /// Maximum number of separator keys in an internal node.
    pub internal_capacity: usize,

    /// Whether every page write and allocation is followed by `fsync()`.
    pub sync_writes: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            leaf_capacity: MAX_LEAF_CAPACITY,
            internal_capacity: MAX_INTERNAL_CAPACITY,
            sync_writes: true,
        }
    }
}

impl IndexOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the leaf capacity.
    pub fn with_leaf_capacity(mut self, capacity: usize) -> Self {
        self.leaf_capacity = capacity;
        self
    }

    /// Sets the internal node capacity.
    pub fn with_internal_capacity(mut self, capacity: usize) -> Self {
        self.internal_capacity = capacity;
        self
    }

    /// Enables or disables fsync after each write.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Check that both capacities are within `MIN_NODE_CAPACITY..=max`.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` naming the offending option.
    pub fn validate(&self) -> Result<()> {
        check_capacity("leaf_capacity", self.leaf_capacity, MAX_LEAF_CAPACITY)?;
        check_capacity(
            "internal_capacity",
            self.internal_capacity,
            MAX_INTERNAL_CAPACITY,
        )
    }
}

fn check_capacity(name: &str, value: usize, max: usize) -> Result<()> {
    if (MIN_NODE_CAPACITY..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must be in {}..={}, got {}",
            name, MIN_NODE_CAPACITY, max, value
        )))
    }
}
