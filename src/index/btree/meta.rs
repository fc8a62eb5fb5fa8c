//! Tree metadata stored in the root page's metadata region.
//!
//! # Layout (20 bytes)
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     magic ("BTIX")
//! 4       2     format version
//! 6       4     height
//! 10      4     root page id
//! 14      2     leaf capacity
//! 16      2     internal capacity
//! 18      2     reserved (zero)
//! ```

use crate::common::PageId;
use crate::storage::page::Page;

use super::node::{read_u16, read_u32, write_u16, write_u32};

/// Tree-wide metadata, persisted with every write of the root page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeMeta {
    /// Levels from root to leaf inclusive; 0 for an empty tree.
    pub height: u32,
    /// Page holding the root node.
    pub root_page_id: PageId,
    pub leaf_capacity: usize,
    pub internal_capacity: usize,
}

impl TreeMeta {
    /// Size of the encoded metadata in bytes.
    pub const SIZE: usize = Page::META_SIZE;

    /// Identifies an index file.
    pub const MAGIC: [u8; 4] = *b"BTIX";

    /// Current format version.
    pub const VERSION: u16 = 1;

    const OFFSET_MAGIC: usize = 0;
    const OFFSET_VERSION: usize = 4;
    const OFFSET_HEIGHT: usize = 6;
    const OFFSET_ROOT: usize = 10;
    const OFFSET_LEAF_CAPACITY: usize = 14;
    const OFFSET_INTERNAL_CAPACITY: usize = 16;

    /// Metadata of a tree that has never received an insert.
    pub fn empty(leaf_capacity: usize, internal_capacity: usize) -> Self {
        Self {
            height: 0,
            root_page_id: PageId::ROOT,
            leaf_capacity,
            internal_capacity,
        }
    }

    /// Decode metadata from a page's metadata region.
    ///
    /// # Errors
    /// Returns a reason string on a bad magic number or unknown version.
    pub fn read_from(data: &[u8]) -> Result<Self, String> {
        if data.len() < Self::SIZE {
            return Err(format!("metadata region of {} bytes", data.len()));
        }

        let magic = &data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4];
        if magic != Self::MAGIC {
            return Err(format!("bad magic {:02x?}", magic));
        }

        let version = read_u16(data, Self::OFFSET_VERSION);
        if version != Self::VERSION {
            return Err(format!("unsupported format version {}", version));
        }

        Ok(Self {
            height: read_u32(data, Self::OFFSET_HEIGHT),
            root_page_id: PageId::new(read_u32(data, Self::OFFSET_ROOT)),
            leaf_capacity: read_u16(data, Self::OFFSET_LEAF_CAPACITY) as usize,
            internal_capacity: read_u16(data, Self::OFFSET_INTERNAL_CAPACITY) as usize,
        })
    }

    /// Encode metadata into a page's metadata region.
    ///
    /// # Panics
    /// Panics if `data.len() < TreeMeta::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for TreeMeta");

        data[..Self::SIZE].fill(0);
        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4].copy_from_slice(&Self::MAGIC);
        write_u16(data, Self::OFFSET_VERSION, Self::VERSION);
        write_u32(data, Self::OFFSET_HEIGHT, self.height);
        write_u32(data, Self::OFFSET_ROOT, self.root_page_id.0);
        write_u16(data, Self::OFFSET_LEAF_CAPACITY, self.leaf_capacity as u16);
        write_u16(
            data,
            Self::OFFSET_INTERNAL_CAPACITY,
            self.internal_capacity as u16,
        );
    }
}
