//! Index keys and record locators.

use std::fmt;

/// Index key: a fixed-width signed integer.
pub type Key = i32;

/// Locates a row in the external table store.
///
/// The index never interprets a `RecordId`; it is stored next to its key
/// and handed back unchanged by lookups and scans.
///
/// # Layout (8 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     page
/// 4       4     slot
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Page of the table file holding the row.
    pub page: u32,
    /// Slot of the row within that page.
    pub slot: u32,
}

impl RecordId {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    /// Create a new record locator.
    #[inline]
    pub fn new(page: u32, slot: u32) -> Self {
        Self { page, slot }
    }

    /// Read a locator from the first [`RecordId::SIZE`] bytes of `data`.
    ///
    /// # Panics
    /// Panics if `data.len() < RecordId::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for RecordId");

        let page = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let slot = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

        Self { page, slot }
    }

    /// Write this locator to the first [`RecordId::SIZE`] bytes of `data`.
    ///
    /// # Panics
    /// Panics if `data.len() < RecordId::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for RecordId");

        data[0..4].copy_from_slice(&self.page.to_le_bytes());
        data[4..8].copy_from_slice(&self.slot.to_le_bytes());
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page, self.slot)
    }
}

/// A (key, locator) pair as stored in a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub key: Key,
    pub record_id: RecordId,
}

impl IndexEntry {
    #[inline]
    pub fn new(key: Key, record_id: RecordId) -> Self {
        Self { key, record_id }
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.key, self.record_id)
    }
}
