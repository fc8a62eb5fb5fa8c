//! Disk Manager - file-backed [`PageStore`].
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating new pages
//! - Managing the index file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{IoStats, OpenMode, PageStore};

/// Manages disk I/O for a single index file.
///
/// # File Layout
/// The index is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (root)  │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// # Durability
/// When `sync_writes` is on (the default), every write and allocation is
/// followed by `fsync()`.
pub struct DiskManager {
    file: File,
    path: PathBuf,
    mode: OpenMode,
    /// Number of pages in the file.
    page_count: u32,
    sync_writes: bool,
    stats: IoStats,
}

impl DiskManager {
    /// Create a new index file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        info!(path = %path.as_ref().display(), "created index file");

        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            mode: OpenMode::Write,
            page_count: 0,
            sync_writes: true,
            stats: IoStats::default(),
        })
    }

    /// Open an index file.
    ///
    /// Under [`OpenMode::Write`] the file is created if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist (read mode) or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        if mode.is_writable() && !path.as_ref().exists() {
            return Self::create(path);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(mode.is_writable())
            .open(path.as_ref())?;

        // Calculate page count from file size
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        info!(
            path = %path.as_ref().display(),
            ?mode,
            page_count,
            "opened index file"
        );

        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            mode,
            page_count,
            sync_writes: true,
            stats: IoStats::default(),
        })
    }

    /// Enable or disable `fsync()` after every write.
    pub fn set_sync_writes(&mut self, sync: bool) {
        self.sync_writes = sync;
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the file was opened with.
    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Get the total size of the index file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn seek_to(&mut self, page_id: PageId) -> Result<()> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl PageStore for DiskManager {
    #[inline]
    fn end_page_id(&self) -> PageId {
        PageId::new(self.page_count)
    }

    fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.seek_to(page_id)?;
        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        self.stats.pages_read += 1;
        Ok(page)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.seek_to(page_id)?;
        self.file.write_all(page.as_slice())?;
        if self.sync_writes {
            self.file.sync_all()?;
        }

        self.stats.pages_written += 1;
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);

        // Extend file with a zeroed page
        self.seek_to(page_id)?;
        let zeros = [0u8; PAGE_SIZE];
        self.file.write_all(&zeros)?;
        if self.sync_writes {
            self.file.sync_all()?;
        }

        self.page_count += 1;
        self.stats.pages_allocated += 1;
        Ok(page_id)
    }

    fn sync(&mut self) -> Result<()> {
        if self.mode.is_writable() {
            self.file.sync_all()?;
            debug!(path = %self.path.display(), "synced index file");
        }
        Ok(())
    }

    #[inline]
    fn stats(&self) -> IoStats {
        self.stats
    }
}
