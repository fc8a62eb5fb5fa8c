//! B+Tree leaf node.
//!
//! A leaf holds sorted `(key, RecordId)` entries and a link to the next leaf
//! in key order. The leaves of one tree form a singly linked chain that
//! forward scans follow.
//!
//! # Payload Layout
//! ```text
//! Offset  Size       Field
//! ------  ----       -----
//! 0       2          entry_count (u16)
//! 2       4          next leaf page id (u32, 0 = end of chain)
//! 6       12 × n     entries: key (i32), record page (u32), record slot (u32)
//! ```

use crate::common::{IndexEntry, Key, PageId, RecordId};
use crate::storage::page::{Page, PageType};

use super::node::{
    read_i32, read_u16, read_u32, write_i32, write_u16, write_u32, NodeCodec, Overflow,
};

/// Bytes before the first entry.
pub const LEAF_HEADER_SIZE: usize = 6;

/// Bytes per entry.
pub const LEAF_ENTRY_SIZE: usize = 4 + RecordId::SIZE;

/// Most entries a leaf page can hold.
pub const MAX_LEAF_CAPACITY: usize = (Page::PAYLOAD_SIZE - LEAF_HEADER_SIZE) / LEAF_ENTRY_SIZE;

/// In-memory view of one leaf page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    entries: Vec<IndexEntry>,
    next: Option<PageId>,
    capacity: usize,
}

impl LeafNode {
    /// Create an empty leaf.
    pub fn new(capacity: usize) -> Self {
        debug_assert!((2..=MAX_LEAF_CAPACITY).contains(&capacity));
        Self {
            entries: Vec::with_capacity(capacity),
            next: None,
            capacity,
        }
    }

    /// Create a leaf holding a single entry.
    pub fn with_entry(capacity: usize, key: Key, record_id: RecordId) -> Self {
        let mut leaf = Self::new(capacity);
        leaf.entries.push(IndexEntry::new(key, record_id));
        leaf
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[inline]
    pub fn first_key(&self) -> Option<Key> {
        self.entries.first().map(|e| e.key)
    }

    /// Next leaf in key order, if any.
    #[inline]
    pub fn next(&self) -> Option<PageId> {
        self.next
    }

    #[inline]
    pub fn set_next(&mut self, next: Option<PageId>) {
        self.next = next;
    }

    /// Insert an entry at its sorted position and return that position.
    ///
    /// Equal keys keep insertion order: the new entry goes after them.
    ///
    /// # Errors
    /// Returns [`Overflow`] if the leaf is full; the leaf is unchanged.
    pub fn insert(&mut self, key: Key, record_id: RecordId) -> Result<usize, Overflow> {
        if self.is_full() {
            return Err(Overflow);
        }
        let pos = self.entries.partition_point(|e| e.key <= key);
        self.entries.insert(pos, IndexEntry::new(key, record_id));
        Ok(pos)
    }

    /// Insert into a full leaf by splitting it.
    ///
    /// The `capacity + 1` entries are divided at `(capacity + 1) / 2`. This
    /// leaf keeps the lower half and the returned sibling the upper half;
    /// the returned key is the sibling's first key. The sibling takes over
    /// this leaf's `next` link and this leaf's link is cleared: the caller
    /// points it at the sibling once the sibling has a page id.
    pub fn insert_and_split(&mut self, key: Key, record_id: RecordId) -> (LeafNode, Key) {
        debug_assert!(self.is_full(), "split of a leaf that still has room");

        let pos = self.entries.partition_point(|e| e.key <= key);
        self.entries.insert(pos, IndexEntry::new(key, record_id));

        let split_at = self.entries.len() / 2;
        let upper = self.entries.split_off(split_at);
        let separator = upper[0].key;

        let mut sibling = LeafNode::new(self.capacity);
        sibling.entries = upper;
        sibling.next = self.next.take();

        (sibling, separator)
    }

    /// Lower-bound search.
    ///
    /// Returns the position of the first entry with `entry.key >= key` and
    /// whether that entry's key equals `key`. The position equals
    /// `entry_count()` when every key is smaller.
    pub fn locate(&self, key: Key) -> (usize, bool) {
        let pos = self.entries.partition_point(|e| e.key < key);
        let found = self.entries.get(pos).is_some_and(|e| e.key == key);
        (pos, found)
    }

    /// Entry at `index`.
    #[inline]
    pub fn read_entry(&self, index: usize) -> Option<IndexEntry> {
        self.entries.get(index).copied()
    }
}

impl NodeCodec for LeafNode {
    const PAGE_TYPE: PageType = PageType::Leaf;

    fn decode(payload: &[u8], capacity: usize) -> Result<Self, String> {
        if payload.len() < LEAF_HEADER_SIZE {
            return Err(format!("leaf payload of {} bytes", payload.len()));
        }

        let count = read_u16(payload, 0) as usize;
        if count > capacity {
            return Err(format!(
                "leaf holds {} entries, capacity is {}",
                count, capacity
            ));
        }
        if LEAF_HEADER_SIZE + count * LEAF_ENTRY_SIZE > payload.len() {
            return Err(format!("{} leaf entries do not fit the page", count));
        }

        let next = PageId::decode_link(read_u32(payload, 2));

        let mut entries = Vec::with_capacity(capacity);
        for i in 0..count {
            let offset = LEAF_HEADER_SIZE + i * LEAF_ENTRY_SIZE;
            let key = read_i32(payload, offset);
            let record_id = RecordId::from_bytes(&payload[offset + 4..offset + LEAF_ENTRY_SIZE]);

            if let Some(prev) = entries.last().map(|e: &IndexEntry| e.key) {
                if prev > key {
                    return Err(format!(
                        "leaf keys out of order at entry {}: {} > {}",
                        i, prev, key
                    ));
                }
            }
            entries.push(IndexEntry::new(key, record_id));
        }

        Ok(Self {
            entries,
            next,
            capacity,
        })
    }

    fn encode_into(&self, payload: &mut [u8]) {
        write_u16(payload, 0, self.entries.len() as u16);
        write_u32(payload, 2, PageId::encode_link(self.next));

        for (i, entry) in self.entries.iter().enumerate() {
            let offset = LEAF_HEADER_SIZE + i * LEAF_ENTRY_SIZE;
            write_i32(payload, offset, entry.key);
            entry
                .record_id
                .write_to(&mut payload[offset + 4..offset + LEAF_ENTRY_SIZE]);
        }
    }
}
