//! Positioning and forward iteration over the leaf chain.

use std::fmt;
use std::ops::{Bound, RangeBounds};

use tracing::trace;

use crate::common::{Error, IndexEntry, Key, PageId, RecordId, Result};
use crate::storage::PageStore;

use super::internal::InternalNode;
use super::leaf::LeafNode;
use super::tree::BTreeIndex;

/// A position in the leaf chain: a leaf page and an entry slot within it.
///
/// A cursor is a plain value. It holds no borrow on the index and stays
/// meaningful only until the next insert, which may move entries between
/// leaves.
///
/// The end position is [`Cursor::END`], whose page is
/// [`PageId::INVALID`]. Page 0 is not an end marker: a single-leaf tree
/// keeps its root leaf there, so `Cursor::new(PageId::ROOT, 0)` addresses
/// the first entry of such a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    page_id: PageId,
    slot: usize,
}

impl Cursor {
    /// Past the last entry of the index. Never on page 0.
    pub const END: Cursor = Cursor {
        page_id: PageId::INVALID,
        slot: 0,
    };

    pub fn new(page_id: PageId, slot: usize) -> Self {
        Self { page_id, slot }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        !self.page_id.is_valid()
    }

    /// Position following this one in `leaf`, which must be the leaf this
    /// cursor points into.
    fn advance(&self, leaf: &LeafNode) -> Cursor {
        if self.slot + 1 < leaf.entry_count() {
            Cursor::new(self.page_id, self.slot + 1)
        } else {
            leaf.next().map_or(Cursor::END, |next| Cursor::new(next, 0))
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            write!(f, "Cursor(END)")
        } else {
            write!(f, "Cursor({}, {})", self.page_id, self.slot)
        }
    }
}

impl<S: PageStore> BTreeIndex<S> {
    /// Find the first entry whose key is `>= key`.
    ///
    /// Returns a cursor at that entry and whether its key equals `key`.
    /// When every key is smaller the cursor is [`Cursor::END`] and `found`
    /// is false. On an empty index this does no I/O.
    ///
    /// With duplicate keys the cursor lands on the first of them.
    pub fn locate(&mut self, key: Key) -> Result<(Cursor, bool)> {
        if self.is_empty() {
            return Ok((Cursor::END, false));
        }

        let mut page_id = self.root_page_id();
        for depth in 1..self.height() {
            let node: InternalNode = self.read_node(page_id)?;
            let child = node.lower_bound_child(key);
            trace!(key, depth, from = page_id.0, to = child.0, "descend for locate");
            page_id = child;
        }

        let leaf: LeafNode = self.read_node(page_id)?;
        let (slot, found) = leaf.locate(key);
        if slot < leaf.entry_count() {
            return Ok((Cursor::new(page_id, slot), found));
        }

        // Every key in the chosen leaf is below `key`. Its successor sits
        // behind a separator `>= key` and leaves are never empty, so the
        // successor's first entry is the answer.
        let Some(next) = leaf.next() else {
            return Ok((Cursor::END, false));
        };
        let successor: LeafNode = self.read_node(next)?;
        let (slot, found) = successor.locate(key);
        if slot < successor.entry_count() {
            return Ok((Cursor::new(next, slot), found));
        }

        Err(Error::corrupted(
            next.0,
            format!("leaf after {} holds no key >= {}", page_id, key),
        ))
    }

    /// Read the entry at `cursor` and return it with the following cursor.
    ///
    /// Returns `Ok(None)` at [`Cursor::END`].
    ///
    /// # Errors
    /// - `Error::InvalidCursor` if the slot is past the leaf's last entry
    /// - `Error::PageNotFound`, `Error::Corrupted` if the page is not a leaf
    ///   of this index
    pub fn read_forward(&mut self, cursor: Cursor) -> Result<Option<(IndexEntry, Cursor)>> {
        if cursor.is_end() {
            return Ok(None);
        }

        let leaf: LeafNode = self.read_node(cursor.page_id)?;
        let entry = entry_at(&leaf, cursor)?;
        Ok(Some((entry, cursor.advance(&leaf))))
    }

    /// Iterate every entry in key order.
    pub fn scan(&mut self) -> Result<Scan<'_, S>> {
        self.range(..)
    }

    /// Iterate the entries whose keys fall in `range`, in key order.
    ///
    /// ```no_run
    /// # use treeindex::{BTreeIndex, OpenMode};
    /// let mut index = BTreeIndex::open("movies.idx", OpenMode::Read)?;
    /// for entry in index.range(100..200)? {
    ///     println!("{}", entry?);
    /// }
    /// # Ok::<(), treeindex::Error>(())
    /// ```
    pub fn range<R: RangeBounds<Key>>(&mut self, range: R) -> Result<Scan<'_, S>> {
        let start = match range.start_bound() {
            Bound::Included(&k) => Some(k),
            Bound::Excluded(&k) => k.checked_add(1),
            Bound::Unbounded => Some(Key::MIN),
        };
        let end = range.end_bound().cloned();

        let cursor = match start {
            Some(k) => self.locate(k)?.0,
            None => Cursor::END,
        };

        Ok(Scan {
            index: self,
            cursor,
            leaf: None,
            end,
            done: false,
        })
    }

    /// Record ids of every entry with exactly `key`, in insertion order.
    pub fn get(&mut self, key: Key) -> Result<Vec<RecordId>> {
        self.range(key..=key)?
            .map(|entry| entry.map(|e| e.record_id))
            .collect()
    }
}

fn entry_at(leaf: &LeafNode, cursor: Cursor) -> Result<IndexEntry> {
    leaf.read_entry(cursor.slot).ok_or_else(|| {
        Error::InvalidCursor(format!(
            "{} but leaf holds {} entries",
            cursor,
            leaf.entry_count()
        ))
    })
}

/// Iterator over a key range, created by [`BTreeIndex::scan`] and
/// [`BTreeIndex::range`].
///
/// Each leaf is read once. The iterator yields `Err` at most once and is
/// fused afterwards.
pub struct Scan<'a, S: PageStore> {
    index: &'a mut BTreeIndex<S>,
    cursor: Cursor,
    leaf: Option<(PageId, LeafNode)>,
    end: Bound<Key>,
    done: bool,
}

impl<S: PageStore> Scan<'_, S> {
    /// Position of the next entry to be yielded.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn past_end(&self, key: Key) -> bool {
        match self.end {
            Bound::Included(end) => key > end,
            Bound::Excluded(end) => key >= end,
            Bound::Unbounded => false,
        }
    }

    fn step(&mut self) -> Result<Option<IndexEntry>> {
        let cached = matches!(&self.leaf, Some((id, _)) if *id == self.cursor.page_id);
        if !cached {
            let leaf: LeafNode = self.index.read_node(self.cursor.page_id)?;
            self.leaf = Some((self.cursor.page_id, leaf));
        }
        let Some((_, leaf)) = &self.leaf else {
            return Ok(None);
        };

        let entry = entry_at(leaf, self.cursor)?;
        if self.past_end(entry.key) {
            return Ok(None);
        }

        self.cursor = self.cursor.advance(leaf);
        Ok(Some(entry))
    }
}

impl<S: PageStore> Iterator for Scan<'_, S> {
    type Item = Result<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_end() {
            return None;
        }

        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::IndexOptions;
    use crate::index::btree::NodeCodec;
    use crate::storage::page::{Page, PageType};
    use crate::storage::{MemoryPageStore, OpenMode};

    fn rid(key: Key) -> RecordId {
        RecordId::new(key as u32, 1)
    }

    /// Capacity-3 tree built from 5, 3, 8, 1, 9, 2, 7:
    ///
    /// ```text
    /// root [p2 | 5 p1 | 8 p3]
    /// p2 [1 2 3] -> p1 [5 7] -> p3 [8 9]
    /// ```
    fn sample_index() -> BTreeIndex<MemoryPageStore> {
        let options = IndexOptions::new()
            .with_leaf_capacity(3)
            .with_internal_capacity(3);
        let mut index =
            BTreeIndex::with_store(MemoryPageStore::new(), OpenMode::Write, options).unwrap();
        for k in [5, 3, 8, 1, 9, 2, 7] {
            index.insert(k, rid(k)).unwrap();
        }
        index
    }

    #[test]
    fn test_locate_exact() {
        let mut index = sample_index();

        let (cursor, found) = index.locate(7).unwrap();
        assert!(found);
        assert_eq!(cursor, Cursor::new(PageId::new(1), 1));
    }

    #[test]
    fn test_locate_between_leaves() {
        let mut index = sample_index();

        // Nothing >= 4 in the leftmost leaf: move to the next leaf's start.
        let (cursor, found) = index.locate(4).unwrap();
        assert!(!found);
        assert_eq!(cursor, Cursor::new(PageId::new(1), 0));

        // 8 is a separator: descent stays left and follows the chain.
        let (cursor, found) = index.locate(8).unwrap();
        assert!(found);
        assert_eq!(cursor, Cursor::new(PageId::new(3), 0));
    }

    #[test]
    fn test_locate_follows_chain_one_leaf_at_most() {
        let mut index = sample_index();
        let before = index.io_stats().pages_read;

        index.locate(4).unwrap();

        // root, the leaf ending at 3, and its successor
        assert_eq!(index.io_stats().pages_read - before, 3);
    }

    #[test]
    fn test_locate_successor_without_larger_key_is_corruption() {
        let index = sample_index();
        let mut store = index.into_store();

        // Rewrite the middle leaf so it holds only keys below 4.
        let mut leaf = LeafNode::new(3);
        leaf.insert(1, rid(1)).unwrap();
        leaf.insert(2, rid(2)).unwrap();
        leaf.set_next(Some(PageId::new(3)));

        let mut page = Page::with_type(PageType::Leaf);
        leaf.encode_into(page.payload_mut());
        page.update_checksum();
        store
            .raw_page_mut(PageId::new(1))
            .unwrap()
            .copy_from_slice(page.as_slice());

        let mut index =
            BTreeIndex::with_store(store, OpenMode::Read, IndexOptions::new()).unwrap();
        let err = index.locate(4).unwrap_err();
        assert!(matches!(err, Error::Corrupted { page_id: 1, .. }));
    }

    #[test]
    fn test_root_leaf_cursor_is_not_end() {
        let options = IndexOptions::new()
            .with_leaf_capacity(3)
            .with_internal_capacity(3);
        let mut index =
            BTreeIndex::with_store(MemoryPageStore::new(), OpenMode::Write, options).unwrap();
        index.insert(10, rid(10)).unwrap();

        let (cursor, found) = index.locate(10).unwrap();
        assert!(found);
        assert_eq!(cursor, Cursor::new(PageId::ROOT, 0));
        assert!(!cursor.is_end());
        assert_ne!(Cursor::END.page_id(), PageId::ROOT);

        let (entry, next) = index.read_forward(cursor).unwrap().unwrap();
        assert_eq!(entry, IndexEntry::new(10, rid(10)));
        assert!(next.is_end());
    }

    #[test]
    fn test_locate_past_end() {
        let mut index = sample_index();
        assert_eq!(index.locate(100).unwrap(), (Cursor::END, false));
    }

    #[test]
    fn test_read_forward_walks_chain() {
        let mut index = sample_index();
        let (mut cursor, _) = index.locate(i32::MIN).unwrap();

        let mut keys = Vec::new();
        while let Some((entry, next)) = index.read_forward(cursor).unwrap() {
            keys.push(entry.key);
            cursor = next;
        }

        assert_eq!(keys, vec![1, 2, 3, 5, 7, 8, 9]);
        assert!(cursor.is_end());
    }

    #[test]
    fn test_read_forward_invalid_slot() {
        let mut index = sample_index();
        let result = index.read_forward(Cursor::new(PageId::new(1), 2));
        assert!(matches!(result, Err(Error::InvalidCursor(_))));
    }

    #[test]
    fn test_read_forward_at_end() {
        let mut index = sample_index();
        assert!(index.read_forward(Cursor::END).unwrap().is_none());
    }

    fn keys(scan: Scan<'_, MemoryPageStore>) -> Vec<Key> {
        scan.map(|e| e.unwrap().key).collect()
    }

    #[test]
    fn test_range_bounds() {
        let mut index = sample_index();

        assert_eq!(keys(index.range(2..8).unwrap()), vec![2, 3, 5, 7]);
        assert_eq!(keys(index.range(2..=8).unwrap()), vec![2, 3, 5, 7, 8]);
        assert_eq!(keys(index.range(6..).unwrap()), vec![7, 8, 9]);
        assert_eq!(keys(index.range(..3).unwrap()), vec![1, 2]);
        assert_eq!(
            keys(index.range((Bound::Excluded(5), Bound::Unbounded)).unwrap()),
            vec![7, 8, 9]
        );
        assert!(keys(index.range(10..20).unwrap()).is_empty());
    }

    #[test]
    fn test_range_excluded_max_is_empty() {
        let mut index = sample_index();
        let scan = index
            .range((Bound::Excluded(Key::MAX), Bound::Unbounded))
            .unwrap();
        assert!(scan.cursor().is_end());
        assert_eq!(scan.count(), 0);
    }

    #[test]
    fn test_scan_reads_each_leaf_once() {
        let mut index = sample_index();
        let before = index.io_stats().pages_read;

        let count = index.scan().unwrap().count();
        assert_eq!(count, 7);

        // root and first leaf to locate, then each of the 3 leaves
        assert_eq!(index.io_stats().pages_read - before, 5);
    }

    #[test]
    fn test_get_duplicates() {
        let mut index = sample_index();
        index.insert(7, RecordId::new(70, 2)).unwrap();
        index.insert(7, RecordId::new(70, 3)).unwrap();

        let rids = index.get(7).unwrap();
        assert_eq!(
            rids,
            vec![rid(7), RecordId::new(70, 2), RecordId::new(70, 3)]
        );
        assert!(index.get(4).unwrap().is_empty());
    }

    #[test]
    fn test_cursor_display() {
        assert_eq!(Cursor::END.to_string(), "Cursor(END)");
        assert_eq!(Cursor::new(PageId::new(4), 2).to_string(), "Cursor(Page(4), 2)");
    }
}
