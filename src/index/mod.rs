//! Index structures.

pub mod btree;

pub use btree::{BTreeIndex, Cursor, Scan, TreeSummary};
