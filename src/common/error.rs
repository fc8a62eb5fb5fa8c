//! Error types for treeindex.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors surfaced by the index.
///
/// Node overflow is resolved inside
/// [`BTreeIndex::insert`](crate::index::btree::BTreeIndex::insert) and never
/// reaches callers. A missing key is reported in `locate`'s result.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the page store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in the store.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Page bytes do not match the stored checksum.
    #[error("Page {0} failed checksum verification")]
    ChecksumMismatch(u32),

    /// A page decoded into a structure that violates tree invariants.
    #[error("Corrupted page {page_id}: {reason}")]
    Corrupted {
        /// The offending page.
        page_id: u32,
        /// What was wrong with it.
        reason: String,
    },

    /// The index was opened read-only and a mutation was attempted.
    #[error("Index is opened read-only")]
    ReadOnly,

    /// A cursor does not address an entry in the leaf chain.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Index options are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Build a [`Error::Corrupted`] for `page_id`.
    pub(crate) fn corrupted(page_id: u32, reason: impl Into<String>) -> Self {
        Error::Corrupted {
            page_id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::ReadOnly;
        assert_eq!(format!("{}", err), "Index is opened read-only");

        let err = Error::corrupted(3, "keys out of order");
        assert_eq!(format!("{}", err), "Corrupted page 3: keys out of order");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::from(io_err);
        assert!(err.source().is_some());
        assert!(Error::ReadOnly.source().is_none());
    }
}
