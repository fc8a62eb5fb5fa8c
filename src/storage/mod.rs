//! Storage layer - page I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`PageStore`] - The page-granular I/O interface the tree uses
//! - [`DiskManager`] - File-backed store
//! - [`MemoryPageStore`] - In-memory store
//! - [`page`] - Page types and layouts

mod disk_manager;
mod memory;
pub mod page;
mod page_store;
mod stats;

pub use disk_manager::DiskManager;
pub use memory::MemoryPageStore;
pub use page_store::{OpenMode, PageStore};
pub use stats::IoStats;
