//! Disk-resident B+Tree.
//!
//! # Components
//! - [`LeafNode`] / [`InternalNode`] - Node layouts and in-memory operations
//! - [`TreeMeta`] - Height and capacities persisted on the root page
//! - [`BTreeIndex`] - Insert, locate and page I/O
//! - [`Cursor`] / [`Scan`] - Forward iteration over the leaf chain
//!
//! Every node occupies exactly one page. Nodes are decoded into owned
//! values, modified, and encoded back; nothing is cached between calls.

mod cursor;
mod debug;
mod internal;
mod leaf;
mod meta;
mod node;
mod tree;

pub use cursor::{Cursor, Scan};
pub use debug::TreeSummary;
pub use internal::{InternalNode, Separator, MAX_INTERNAL_CAPACITY};
pub use leaf::{LeafNode, MAX_LEAF_CAPACITY};
pub use meta::TreeMeta;
pub use node::{NodeCodec, Overflow};
pub use tree::BTreeIndex;
