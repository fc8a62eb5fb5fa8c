//! B+Tree index - insertion, root growth and page I/O.
//!
//! Descent, cursors and scans live in [`super::cursor`]; diagnostics in
//! [`super::debug`].

use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::common::{Error, IndexOptions, Key, PageId, RecordId, Result};
use crate::storage::page::{Page, PageType};
use crate::storage::{DiskManager, IoStats, OpenMode, PageStore};

use super::internal::InternalNode;
use super::leaf::LeafNode;
use super::meta::TreeMeta;
use super::node::NodeCodec;

/// Result of inserting into one subtree.
///
/// `Split` is a control signal for the parent, not an error: the insert
/// succeeded, but the subtree's node split and the parent must absorb a
/// new separator pointing at `sibling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
    Inserted,
    Split { separator: Key, sibling: PageId },
}

/// A disk-resident B+Tree mapping `i32` keys to [`RecordId`]s.
///
/// # Structure
/// ```text
///                     ┌──────────────────────┐
///   page 0 (root) ──▶ │ [p2 | 5 p1 | 8 p3]   │  internal
///                     └──────────────────────┘
///                        │      │       │
///                ┌───────┘      │       └────────┐
///                ▼              ▼                ▼
///           ┌─────────┐    ┌─────────┐     ┌─────────┐
///           │ 1 2 3   │──▶ │ 5 7     │ ──▶ │ 8 9     │  leaves
///           └─────────┘    └─────────┘     └─────────┘
/// ```
///
/// The root always lives at page 0, so a reader can find it without any
/// other bookkeeping; when the root splits its old contents move to a fresh
/// page. Height and node capacities are persisted in the metadata region of
/// page 0.
///
/// # Thread Safety
/// All operations take `&mut self` and run to completion on the caller's
/// thread. There is no locking and no crash consistency.
///
/// # Example
/// ```no_run
/// use treeindex::{BTreeIndex, OpenMode, RecordId};
///
/// let mut index = BTreeIndex::open("movies.idx", OpenMode::Write)?;
/// index.insert(42, RecordId::new(3, 1))?;
///
/// let (cursor, found) = index.locate(42)?;
/// assert!(found);
/// let (entry, _next) = index.read_forward(cursor)?.unwrap();
/// assert_eq!(entry.record_id, RecordId::new(3, 1));
/// index.close()?;
/// # Ok::<(), treeindex::Error>(())
/// ```
pub struct BTreeIndex<S: PageStore = DiskManager> {
    store: S,
    meta: TreeMeta,
    mode: OpenMode,
}

impl BTreeIndex<DiskManager> {
    /// Open an index file with default options.
    ///
    /// Under [`OpenMode::Write`] the file is created if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::open_with_options(path, mode, IndexOptions::default())
    }

    /// Open an index file.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if the options are out of range
    /// - `Error::Io` if the file cannot be opened
    /// - `Error::Corrupted` / `Error::ChecksumMismatch` if page 0 is not a
    ///   valid root page
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        options: IndexOptions,
    ) -> Result<Self> {
        options.validate()?;
        let mut disk_manager = DiskManager::open(path, mode)?;
        disk_manager.set_sync_writes(options.sync_writes);
        Self::with_store(disk_manager, mode, options)
    }
}

impl<S: PageStore> BTreeIndex<S> {
    /// Build an index over an arbitrary page store.
    ///
    /// An empty store yields an empty tree using the capacities from
    /// `options`; otherwise the metadata on page 0 is loaded and its
    /// capacities take precedence.
    pub fn with_store(mut store: S, mode: OpenMode, options: IndexOptions) -> Result<Self> {
        options.validate()?;

        let meta = if store.page_count() == 0 {
            TreeMeta::empty(options.leaf_capacity, options.internal_capacity)
        } else {
            let meta = Self::load_meta(&mut store)?;
            if meta.leaf_capacity != options.leaf_capacity
                || meta.internal_capacity != options.internal_capacity
            {
                warn!(
                    persisted_leaf = meta.leaf_capacity,
                    persisted_internal = meta.internal_capacity,
                    requested_leaf = options.leaf_capacity,
                    requested_internal = options.internal_capacity,
                    "ignoring requested node capacities, using persisted ones"
                );
            }
            meta
        };

        info!(
            height = meta.height,
            pages = store.page_count(),
            ?mode,
            "opened B+Tree index"
        );

        Ok(Self { store, meta, mode })
    }

    fn load_meta(store: &mut S) -> Result<TreeMeta> {
        let page = store.read_page(PageId::ROOT)?;
        if !page.verify_checksum() {
            return Err(Error::ChecksumMismatch(PageId::ROOT.0));
        }

        let meta = TreeMeta::read_from(page.meta()).map_err(|r| Error::corrupted(0, r))?;

        if meta.height == 0 {
            return Err(Error::corrupted(0, "root page present but height is 0"));
        }
        if !meta.root_page_id.is_root() {
            return Err(Error::corrupted(
                0,
                format!("root recorded at {}", meta.root_page_id),
            ));
        }
        IndexOptions::new()
            .with_leaf_capacity(meta.leaf_capacity)
            .with_internal_capacity(meta.internal_capacity)
            .validate()
            .map_err(|e| Error::corrupted(0, e.to_string()))?;

        Ok(meta)
    }

    /// Flush and close the index.
    pub fn close(mut self) -> Result<()> {
        self.store.sync()?;
        info!(height = self.meta.height, "closed B+Tree index");
        Ok(())
    }

    /// Number of node levels from root to leaf; 0 for an empty tree.
    #[inline]
    pub fn height(&self) -> u32 {
        self.meta.height
    }

    /// Page holding the root node.
    #[inline]
    pub fn root_page_id(&self) -> PageId {
        self.meta.root_page_id
    }

    /// Whether nothing has been inserted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meta.height == 0
    }

    #[inline]
    pub fn leaf_capacity(&self) -> usize {
        self.meta.leaf_capacity
    }

    #[inline]
    pub fn internal_capacity(&self) -> usize {
        self.meta.internal_capacity
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// I/O counters of the underlying page store.
    pub fn io_stats(&self) -> IoStats {
        self.store.stats()
    }

    /// Borrow the underlying page store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give up the index and return its page store.
    pub fn into_store(self) -> S {
        self.store
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert a `(key, record_id)` pair.
    ///
    /// Duplicate keys are kept side by side; nothing is deduplicated.
    ///
    /// # Errors
    /// - `Error::ReadOnly` if the index was opened read-only
    /// - I/O and corruption errors from the pages touched; the insert stops
    ///   at the first failure and pages already written stay written
    pub fn insert(&mut self, key: Key, record_id: RecordId) -> Result<()> {
        if !self.mode.is_writable() {
            return Err(Error::ReadOnly);
        }

        if self.is_empty() {
            return self.insert_first(key, record_id);
        }

        let root = self.meta.root_page_id;
        match self.insert_recursive(key, record_id, 1, root)? {
            InsertOutcome::Inserted => Ok(()),
            InsertOutcome::Split { separator, sibling } => self.grow_root(separator, sibling),
        }
    }

    /// First insert: the root is a single leaf on page 0.
    fn insert_first(&mut self, key: Key, record_id: RecordId) -> Result<()> {
        let page_id = self.store.allocate_page()?;
        if page_id != self.meta.root_page_id {
            return Err(Error::corrupted(
                page_id.0,
                "empty tree over a non-empty page store",
            ));
        }

        let leaf = LeafNode::with_entry(self.meta.leaf_capacity, key, record_id);
        self.meta.height = 1;
        if let Err(e) = self.write_node(page_id, &leaf) {
            self.meta.height = 0;
            return Err(e);
        }

        debug!(key, "created root leaf");
        Ok(())
    }

    /// Insert into the subtree rooted at `page_id`, which sits at `depth`
    /// (the root is depth 1, leaves are depth `height`).
    fn insert_recursive(
        &mut self,
        key: Key,
        record_id: RecordId,
        depth: u32,
        page_id: PageId,
    ) -> Result<InsertOutcome> {
        if depth == self.meta.height {
            return self.insert_into_leaf(key, record_id, page_id);
        }

        let mut node: InternalNode = self.read_node(page_id)?;
        let child = node.locate_child(key);
        trace!(key, depth, from = page_id.0, to = child.0, "descend for insert");

        let (separator, sibling) = match self.insert_recursive(key, record_id, depth + 1, child)? {
            InsertOutcome::Inserted => return Ok(InsertOutcome::Inserted),
            InsertOutcome::Split { separator, sibling } => (separator, sibling),
        };

        if node.insert(separator, sibling).is_ok() {
            self.write_node(page_id, &node)?;
            return Ok(InsertOutcome::Inserted);
        }

        let sibling_page_id = self.store.allocate_page()?;
        let (new_node, promoted) = node.insert_and_split(separator, sibling);
        self.write_node(sibling_page_id, &new_node)?;
        self.write_node(page_id, &node)?;

        debug!(
            page = page_id.0,
            sibling = sibling_page_id.0,
            promoted,
            depth,
            "split internal node"
        );

        Ok(InsertOutcome::Split {
            separator: promoted,
            sibling: sibling_page_id,
        })
    }

    fn insert_into_leaf(
        &mut self,
        key: Key,
        record_id: RecordId,
        page_id: PageId,
    ) -> Result<InsertOutcome> {
        let mut leaf: LeafNode = self.read_node(page_id)?;

        if leaf.insert(key, record_id).is_ok() {
            self.write_node(page_id, &leaf)?;
            return Ok(InsertOutcome::Inserted);
        }

        let sibling_page_id = self.store.allocate_page()?;
        let (sibling, separator) = leaf.insert_and_split(key, record_id);
        leaf.set_next(Some(sibling_page_id));

        self.write_node(sibling_page_id, &sibling)?;
        self.write_node(page_id, &leaf)?;

        debug!(
            page = page_id.0,
            sibling = sibling_page_id.0,
            separator,
            "split leaf"
        );

        Ok(InsertOutcome::Split {
            separator,
            sibling: sibling_page_id,
        })
    }

    /// The root split: move its left half off page 0 and install a new
    /// two-child root there, one level higher.
    fn grow_root(&mut self, separator: Key, sibling: PageId) -> Result<()> {
        let root = self.meta.root_page_id;
        let relocated = self.store.allocate_page()?;

        if self.meta.height == 1 {
            let leaf: LeafNode = self.read_node(root)?;
            self.write_node(relocated, &leaf)?;
        } else {
            let node: InternalNode = self.read_node(root)?;
            self.write_node(relocated, &node)?;
        }

        let new_root =
            InternalNode::new_root(self.meta.internal_capacity, relocated, separator, sibling);

        self.meta.height += 1;
        if let Err(e) = self.write_node(root, &new_root) {
            self.meta.height -= 1;
            return Err(e);
        }

        debug!(
            height = self.meta.height,
            relocated = relocated.0,
            sibling = sibling.0,
            separator,
            "grew root"
        );
        Ok(())
    }

    // ========================================================================
    // Node I/O
    // ========================================================================

    fn capacity_for(&self, page_type: PageType) -> usize {
        match page_type {
            PageType::Leaf => self.meta.leaf_capacity,
            PageType::Internal => self.meta.internal_capacity,
            PageType::Invalid => 0,
        }
    }

    /// Read and decode a node, verifying checksum and page type.
    pub(super) fn read_node<N: NodeCodec>(&mut self, page_id: PageId) -> Result<N> {
        let page = self.store.read_page(page_id)?;
        if !page.verify_checksum() {
            return Err(Error::ChecksumMismatch(page_id.0));
        }

        let found = page.header().page_type;
        if found != N::PAGE_TYPE {
            return Err(Error::corrupted(
                page_id.0,
                format!("expected {:?} node, found {:?}", N::PAGE_TYPE, found),
            ));
        }

        N::decode(page.payload(), self.capacity_for(N::PAGE_TYPE))
            .map_err(|reason| Error::corrupted(page_id.0, reason))
    }

    /// Encode and write a node. Writes to the root page carry the current
    /// tree metadata.
    fn write_node<N: NodeCodec>(&mut self, page_id: PageId, node: &N) -> Result<()> {
        let mut page = Page::with_type(N::PAGE_TYPE);
        if page_id == self.meta.root_page_id {
            self.meta.write_to(page.meta_mut());
        }
        node.encode_into(page.payload_mut());
        page.update_checksum();

        self.store.write_page(page_id, &page)
    }
}
