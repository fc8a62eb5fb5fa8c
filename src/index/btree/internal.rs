//! B+Tree internal node.
//!
//! # Payload Layout
//! ```text
//! Offset  Size      Field
//! ------  ----      -----
//! 0       2         key_count (u16)
//! 2       4         leftmost child page id (u32)
//! 6       8 × n     entries: separator key (i32), child page id (u32)
//! ```
//!
//! A node with `n` separators has `n + 1` children. Child `i + 1` (the child
//! stored next to separator `i`) holds keys `>= sep[i]`; the leftmost child
//! holds keys `< sep[0]`.

use crate::common::{Key, PageId};
use crate::storage::page::{Page, PageType};

use super::node::{
    read_i32, read_u16, read_u32, write_i32, write_u16, write_u32, NodeCodec, Overflow,
};

/// Bytes before the first entry.
pub const INTERNAL_HEADER_SIZE: usize = 6;

/// Bytes per (separator, child) entry.
pub const INTERNAL_ENTRY_SIZE: usize = 8;

/// Most separators an internal page can hold.
pub const MAX_INTERNAL_CAPACITY: usize =
    (Page::PAYLOAD_SIZE - INTERNAL_HEADER_SIZE) / INTERNAL_ENTRY_SIZE;

/// A separator key and the child holding keys at or above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separator {
    pub key: Key,
    pub child: PageId,
}

/// In-memory view of one internal page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    leftmost: PageId,
    entries: Vec<Separator>,
    capacity: usize,
}

impl InternalNode {
    /// Create a node with a single child and no separators.
    pub fn new(capacity: usize, leftmost: PageId) -> Self {
        debug_assert!((2..=MAX_INTERNAL_CAPACITY).contains(&capacity));
        Self {
            leftmost,
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Build the two-child root used when the tree grows a level.
    pub fn new_root(capacity: usize, left: PageId, separator: Key, right: PageId) -> Self {
        let mut root = Self::new(capacity, left);
        root.entries.push(Separator {
            key: separator,
            child: right,
        });
        root
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[inline]
    pub fn leftmost(&self) -> PageId {
        self.leftmost
    }

    #[inline]
    pub fn separators(&self) -> &[Separator] {
        &self.entries
    }

    /// Separator keys in order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.entries.iter().map(|s| s.key)
    }

    /// All children, leftmost first.
    pub fn children(&self) -> impl Iterator<Item = PageId> + '_ {
        std::iter::once(self.leftmost).chain(self.entries.iter().map(|s| s.child))
    }

    /// Child to descend into when inserting `key`.
    ///
    /// The leftmost child if `key` is below the first separator, otherwise
    /// the child following the greatest separator `<= key`.
    pub fn locate_child(&self, key: Key) -> PageId {
        let idx = self.entries.partition_point(|s| s.key <= key);
        self.child_before(idx)
    }

    /// Child holding the first entry `>= key`.
    ///
    /// Follows the greatest separator strictly below `key`. Differs from
    /// [`InternalNode::locate_child`] only when `key` equals a separator, in
    /// which case equal keys left behind by an earlier split are still
    /// reached (the caller follows the leaf chain if the chosen leaf has
    /// nothing `>= key`).
    pub fn lower_bound_child(&self, key: Key) -> PageId {
        let idx = self.entries.partition_point(|s| s.key < key);
        self.child_before(idx)
    }

    fn child_before(&self, idx: usize) -> PageId {
        if idx == 0 {
            self.leftmost
        } else {
            self.entries[idx - 1].child
        }
    }

    /// Insert a separator and the child to its right.
    ///
    /// # Errors
    /// Returns [`Overflow`] if the node is full; the node is unchanged.
    pub fn insert(&mut self, key: Key, child: PageId) -> Result<usize, Overflow> {
        if self.is_full() {
            return Err(Overflow);
        }
        let pos = self.entries.partition_point(|s| s.key <= key);
        self.entries.insert(pos, Separator { key, child });
        Ok(pos)
    }

    /// Insert into a full node by splitting it.
    ///
    /// Of the `capacity + 1` separators, the one at `(capacity + 1) / 2` is
    /// promoted: its key is returned for the parent and its child becomes
    /// the sibling's leftmost child. This node keeps the separators below
    /// it, the sibling those above it.
    pub fn insert_and_split(&mut self, key: Key, child: PageId) -> (InternalNode, Key) {
        debug_assert!(self.is_full(), "split of an internal node that still has room");

        let pos = self.entries.partition_point(|s| s.key <= key);
        self.entries.insert(pos, Separator { key, child });

        let mid = self.entries.len() / 2;
        let mut upper = self.entries.split_off(mid);
        let promoted = upper.remove(0);

        let mut sibling = InternalNode::new(self.capacity, promoted.child);
        sibling.entries = upper;

        (sibling, promoted.key)
    }
}

impl NodeCodec for InternalNode {
    const PAGE_TYPE: PageType = PageType::Internal;

    fn decode(payload: &[u8], capacity: usize) -> Result<Self, String> {
        if payload.len() < INTERNAL_HEADER_SIZE {
            return Err(format!("internal payload of {} bytes", payload.len()));
        }

        let count = read_u16(payload, 0) as usize;
        if count == 0 {
            return Err("internal node without separators".to_string());
        }
        if count > capacity {
            return Err(format!(
                "internal node holds {} keys, capacity is {}",
                count, capacity
            ));
        }
        if INTERNAL_HEADER_SIZE + count * INTERNAL_ENTRY_SIZE > payload.len() {
            return Err(format!("{} internal entries do not fit the page", count));
        }

        let leftmost = PageId::new(read_u32(payload, 2));
        if leftmost.is_root() {
            return Err("child pointer refers to the root page".to_string());
        }

        let mut entries: Vec<Separator> = Vec::with_capacity(capacity);
        for i in 0..count {
            let offset = INTERNAL_HEADER_SIZE + i * INTERNAL_ENTRY_SIZE;
            let key = read_i32(payload, offset);
            let child = PageId::new(read_u32(payload, offset + 4));

            if child.is_root() {
                return Err("child pointer refers to the root page".to_string());
            }
            if let Some(prev) = entries.last() {
                if prev.key > key {
                    return Err(format!(
                        "separators out of order at entry {}: {} > {}",
                        i, prev.key, key
                    ));
                }
            }
            entries.push(Separator { key, child });
        }

        Ok(Self {
            leftmost,
            entries,
            capacity,
        })
    }

    fn encode_into(&self, payload: &mut [u8]) {
        write_u16(payload, 0, self.entries.len() as u16);
        write_u32(payload, 2, self.leftmost.0);

        for (i, sep) in self.entries.iter().enumerate() {
            let offset = INTERNAL_HEADER_SIZE + i * INTERNAL_ENTRY_SIZE;
            write_i32(payload, offset, sep.key);
            write_u32(payload, offset + 4, sep.child.0);
        }
    }
}
