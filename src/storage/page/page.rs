//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O
//! between the page store and the tree.

use crate::common::config::PAGE_SIZE;

use super::page_header::{PageHeader, PageType};

/// A page of data (4KB, 4KB-aligned).
///
/// # Layout
/// ```text
/// ┌────────────┬──────────────────┬──────────────────────────────┐
/// │ PageHeader │ metadata region  │ node payload                 │
/// │ (5 bytes)  │ (20 bytes)       │ (4071 bytes)                 │
/// └────────────┴──────────────────┴──────────────────────────────┘
/// ```
///
/// The metadata region is only meaningful on the root page; every page
/// reserves it so that node capacity does not depend on where a node lives.
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code (copying 4KB should
/// be explicit). A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use treeindex::storage::page::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
/// assert_eq!(page.as_slice()[0], 0xFF);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Size of the metadata region following the header.
    pub const META_SIZE: usize = 20;

    /// Offset of the metadata region.
    pub const META_OFFSET: usize = PageHeader::SIZE;

    /// Offset of the node payload.
    pub const PAYLOAD_OFFSET: usize = Self::META_OFFSET + Self::META_SIZE;

    /// Bytes available to a node.
    pub const PAYLOAD_SIZE: usize = PAGE_SIZE - Self::PAYLOAD_OFFSET;

    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Create a zeroed page carrying the given type in its header.
    pub fn with_type(page_type: PageType) -> Self {
        let mut page = Self::new();
        page.set_header(&PageHeader::new(page_type));
        page
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The metadata region.
    #[inline]
    pub fn meta(&self) -> &[u8] {
        &self.data[Self::META_OFFSET..Self::PAYLOAD_OFFSET]
    }

    /// The metadata region, mutably.
    #[inline]
    pub fn meta_mut(&mut self) -> &mut [u8] {
        &mut self.data[Self::META_OFFSET..Self::PAYLOAD_OFFSET]
    }

    /// The node payload.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[Self::PAYLOAD_OFFSET..]
    }

    /// The node payload, mutably.
    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.data[Self::PAYLOAD_OFFSET..]
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Read the page header.
    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    /// Write a page header.
    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Compute and store checksum in the header.
    ///
    /// Call this after all modifications to the page are complete.
    pub fn update_checksum(&mut self) {
        let checksum = PageHeader::compute_checksum(&self.data);
        let checksum_bytes = checksum.to_le_bytes();
        self.data[PageHeader::OFFSET_CHECKSUM..PageHeader::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum_bytes);
    }

    /// Verify the page checksum is valid.
    pub fn verify_checksum(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), PAGE_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_region_layout() {
        assert_eq!(Page::META_OFFSET, 5);
        assert_eq!(Page::PAYLOAD_OFFSET, 25);
        assert_eq!(Page::PAYLOAD_SIZE, 4071);

        let page = Page::new();
        assert_eq!(page.meta().len(), Page::META_SIZE);
        assert_eq!(page.payload().len(), Page::PAYLOAD_SIZE);
    }

    #[test]
    fn test_regions_do_not_overlap() {
        let mut page = Page::with_type(PageType::Leaf);
        page.meta_mut().fill(0xAA);
        page.payload_mut().fill(0xBB);

        assert_eq!(page.header().page_type, PageType::Leaf);
        assert_eq!(page.as_slice()[Page::META_OFFSET], 0xAA);
        assert_eq!(page.as_slice()[Page::PAYLOAD_OFFSET - 1], 0xAA);
        assert_eq!(page.as_slice()[Page::PAYLOAD_OFFSET], 0xBB);
    }

    #[test]
    fn test_checksum_update_and_verify() {
        let mut page = Page::with_type(PageType::Internal);
        page.payload_mut()[10] = 0x42;
        page.update_checksum();
        assert!(page.verify_checksum());

        page.payload_mut()[10] = 0x43;
        assert!(!page.verify_checksum());
    }

    #[test]
    fn test_page_reset() {
        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[100] = 0xAB;

        page.reset();

        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[100], 0);
    }
}
