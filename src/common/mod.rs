//! Common types and utilities shared across treeindex.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`IndexOptions`]
//! - Error types
//! - Identifiers and values (PageId, Key, RecordId)

pub mod config;
pub mod error;
mod page_id;
mod record_id;

pub use config::IndexOptions;
pub use error::{Error, Result};
pub use page_id::PageId;
pub use record_id::{IndexEntry, Key, RecordId};
