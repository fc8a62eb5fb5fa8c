//! In-memory [`PageStore`], used for tests and throwaway indexes.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{IoStats, PageStore};

/// Pages kept in a `Vec`, one boxed buffer per page.
///
/// Behaves exactly like [`DiskManager`](super::DiskManager) with respect to
/// bounds checks and statistics, so tree behaviour (including how many pages
/// an operation touches) can be asserted without a file.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: Vec<Box<[u8; PAGE_SIZE]>>,
    stats: IoStats,
}

impl MemoryPageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of a page, bypassing statistics.
    pub fn raw_page(&self, page_id: PageId) -> Option<&[u8]> {
        self.pages.get(page_id.0 as usize).map(|p| &p[..])
    }

    /// Mutable raw bytes of a page, for injecting corruption in tests.
    pub fn raw_page_mut(&mut self, page_id: PageId) -> Option<&mut [u8]> {
        self.pages.get_mut(page_id.0 as usize).map(|p| &mut p[..])
    }
}

impl PageStore for MemoryPageStore {
    #[inline]
    fn end_page_id(&self) -> PageId {
        PageId::new(self.pages.len() as u32)
    }

    fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        let data = self
            .pages
            .get(page_id.0 as usize)
            .ok_or(Error::PageNotFound(page_id.0))?;

        let mut page = Page::new();
        page.as_mut_slice().copy_from_slice(&data[..]);

        self.stats.pages_read += 1;
        Ok(page)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        let data = self
            .pages
            .get_mut(page_id.0 as usize)
            .ok_or(Error::PageNotFound(page_id.0))?;

        data.copy_from_slice(page.as_slice());

        self.stats.pages_written += 1;
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = self.end_page_id();
        self.pages.push(Box::new([0u8; PAGE_SIZE]));

        self.stats.pages_allocated += 1;
        Ok(page_id)
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn stats(&self) -> IoStats {
        self.stats
    }
}
