//! treeindex - A disk-resident B+Tree index over fixed-size pages.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           treeindex                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   BTreeIndex: insert / locate / read_forward / range     │   │
//! │  │   LeafNode + InternalNode + TreeMeta codecs              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              PageStore trait (storage/)                  │   │
//! │  │        read_page / write_page / allocate_page            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                  ↓                           ↓                  │
//! │  ┌──────────────────────────┐   ┌──────────────────────────┐   │
//! │  │  DiskManager (file)       │   │  MemoryPageStore (tests) │   │
//! │  └──────────────────────────┘   └──────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, Error, options)
//! - [`storage`] - Page store implementations and page formats
//! - [`index`] - The B+Tree
//!
//! # Quick Start
//! ```no_run
//! use treeindex::{BTreeIndex, OpenMode, RecordId};
//!
//! let mut index = BTreeIndex::open("titles.idx", OpenMode::Write)?;
//! for (key, page) in [(1997, 3), (2003, 7), (1985, 1)] {
//!     index.insert(key, RecordId::new(page, 0))?;
//! }
//!
//! for entry in index.range(1990..)? {
//!     println!("{}", entry?);
//! }
//! index.close()?;
//! # Ok::<(), treeindex::Error>(())
//! ```

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, IndexEntry, IndexOptions, Key, PageId, RecordId, Result};

pub use index::btree::{
    BTreeIndex, Cursor, InternalNode, LeafNode, Scan, TreeMeta, TreeSummary,
    MAX_INTERNAL_CAPACITY, MAX_LEAF_CAPACITY,
};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::{DiskManager, IoStats, MemoryPageStore, OpenMode, PageStore};
