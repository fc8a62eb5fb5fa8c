//! The page store abstraction the tree performs all I/O through.

use crate::common::{PageId, Result};
use crate::storage::page::Page;
use crate::storage::IoStats;

/// How an index file is opened.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; the file must exist.
    #[default]
    Read,
    /// Read-write; the file is created if it does not exist.
    Write,
}

impl OpenMode {
    /// Whether mutations are allowed.
    #[inline]
    pub fn is_writable(&self) -> bool {
        matches!(self, OpenMode::Write)
    }
}

/// Fixed-size page storage addressed by page ordinal.
///
/// Pages are numbered densely from 0; [`PageStore::allocate_page`] appends a
/// zeroed page at [`PageStore::end_page_id`]. Reads and writes always move
/// whole pages.
pub trait PageStore {
    /// The id the next allocation will return (equals the page count).
    fn end_page_id(&self) -> PageId;

    /// Read a whole page.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if `page_id >= end_page_id()`.
    fn read_page(&mut self, page_id: PageId) -> Result<Page>;

    /// Overwrite a whole page.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()>;

    /// Append a zeroed page and return its id.
    fn allocate_page(&mut self) -> Result<PageId>;

    /// Flush everything written so far to durable storage.
    fn sync(&mut self) -> Result<()>;

    /// I/O counters since the store was opened.
    fn stats(&self) -> IoStats;

    /// Number of pages in the store.
    #[inline]
    fn page_count(&self) -> u32 {
        self.end_page_id().0
    }
}
