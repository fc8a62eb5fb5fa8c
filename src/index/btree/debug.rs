//! Diagnostics: a printable dump of the tree and a structural check.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::common::{Error, Key, PageId, Result};
use crate::storage::PageStore;

use super::internal::InternalNode;
use super::leaf::LeafNode;
use super::tree::BTreeIndex;

/// Node and entry counts gathered by [`BTreeIndex::check_integrity`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeSummary {
    pub height: u32,
    pub internal_nodes: usize,
    pub leaf_nodes: usize,
    pub entries: usize,
}

impl fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TreeSummary {{ height: {}, internal: {}, leaves: {}, entries: {} }}",
            self.height, self.internal_nodes, self.leaf_nodes, self.entries
        )
    }
}

/// State threaded through the recursive check.
struct Walk {
    summary: TreeSummary,
    visited: HashSet<PageId>,
    leaves: Vec<PageId>,
}

fn key_list(keys: impl Iterator<Item = Key>) -> String {
    keys.map(|k| k.to_string()).collect::<Vec<_>>().join(" ")
}

impl<S: PageStore> BTreeIndex<S> {
    /// Render the tree in pre-order, one node per line, indented by depth.
    ///
    /// ```text
    /// internal Page(0) keys=[5 8] children=[2 1 3]
    ///   leaf Page(2) keys=[1 2 3] next=1
    ///   leaf Page(1) keys=[5 7] next=3
    ///   leaf Page(3) keys=[8 9] next=-
    /// ```
    pub fn dump(&mut self) -> Result<String> {
        let mut out = String::new();
        if self.is_empty() {
            out.push_str("(empty)\n");
            return Ok(out);
        }

        let root = self.root_page_id();
        self.dump_node(root, 1, &mut out)?;
        Ok(out)
    }

    fn dump_node(&mut self, page_id: PageId, depth: u32, out: &mut String) -> Result<()> {
        let indent = "  ".repeat(depth as usize - 1);

        if depth == self.height() {
            let leaf: LeafNode = self.read_node(page_id)?;
            let next = leaf
                .next()
                .map_or_else(|| "-".to_string(), |p| p.0.to_string());
            out.push_str(&format!(
                "{}leaf {} keys=[{}] next={}\n",
                indent,
                page_id,
                key_list(leaf.entries().iter().map(|e| e.key)),
                next
            ));
            return Ok(());
        }

        let node: InternalNode = self.read_node(page_id)?;
        let children: Vec<PageId> = node.children().collect();
        out.push_str(&format!(
            "{}internal {} keys=[{}] children=[{}]\n",
            indent,
            page_id,
            key_list(node.keys()),
            children
                .iter()
                .map(|c| c.0.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        ));

        for child in children {
            self.dump_node(child, depth + 1, out)?;
        }
        Ok(())
    }

    /// Walk the whole tree and verify its structure.
    ///
    /// Checks that every page decodes, that each subtree's keys respect the
    /// separators above it, that no page is reachable twice, that all
    /// leaves sit at the same depth, and that the leaf chain visits exactly
    /// the tree's leaves in key order.
    ///
    /// # Errors
    /// The first violation found, as `Error::Corrupted` (or the I/O error
    /// that prevented the check).
    pub fn check_integrity(&mut self) -> Result<TreeSummary> {
        let mut walk = Walk {
            summary: TreeSummary {
                height: self.height(),
                ..TreeSummary::default()
            },
            visited: HashSet::new(),
            leaves: Vec::new(),
        };

        if self.is_empty() {
            return Ok(walk.summary);
        }

        let root = self.root_page_id();
        self.check_subtree(root, 1, None, None, &mut walk)?;
        self.check_leaf_chain(&walk.leaves)?;

        debug!(summary = %walk.summary, "integrity check passed");
        Ok(walk.summary)
    }

    /// Keys of the subtree at `page_id` must lie in `[lower, upper]`.
    /// Separators equal to a bound are allowed on both sides because a
    /// split may leave equal keys in both halves.
    fn check_subtree(
        &mut self,
        page_id: PageId,
        depth: u32,
        lower: Option<Key>,
        upper: Option<Key>,
        walk: &mut Walk,
    ) -> Result<()> {
        if !walk.visited.insert(page_id) {
            return Err(Error::corrupted(page_id.0, "page reachable more than once"));
        }

        let out_of_bounds = |key: Key| {
            lower.is_some_and(|lo| key < lo) || upper.is_some_and(|hi| key > hi)
        };

        if depth == self.height() {
            let leaf: LeafNode = self.read_node(page_id)?;
            if leaf.entry_count() == 0 {
                return Err(Error::corrupted(page_id.0, "empty leaf"));
            }
            if let Some(e) = leaf.entries().iter().find(|e| out_of_bounds(e.key)) {
                return Err(Error::corrupted(
                    page_id.0,
                    format!("key {} outside {:?}..={:?}", e.key, lower, upper),
                ));
            }

            walk.summary.leaf_nodes += 1;
            walk.summary.entries += leaf.entry_count();
            walk.leaves.push(page_id);
            return Ok(());
        }

        let node: InternalNode = self.read_node(page_id)?;
        if let Some(k) = node.keys().find(|&k| out_of_bounds(k)) {
            return Err(Error::corrupted(
                page_id.0,
                format!("separator {} outside {:?}..={:?}", k, lower, upper),
            ));
        }
        walk.summary.internal_nodes += 1;

        let keys: Vec<Key> = node.keys().collect();
        for (i, child) in node.children().enumerate() {
            let lo = if i == 0 { lower } else { Some(keys[i - 1]) };
            let hi = if i == keys.len() { upper } else { Some(keys[i]) };
            self.check_subtree(child, depth + 1, lo, hi, walk)?;
        }
        Ok(())
    }

    fn check_leaf_chain(&mut self, leaves: &[PageId]) -> Result<()> {
        let mut current = leaves.first().copied();
        let mut position = 0;
        let mut last_key: Option<Key> = None;

        while let Some(page_id) = current {
            match leaves.get(position) {
                Some(&expected) if expected == page_id => {}
                Some(&expected) => {
                    return Err(Error::corrupted(
                        page_id.0,
                        format!("leaf chain reached {} where {} was expected", page_id, expected),
                    ));
                }
                None => {
                    return Err(Error::corrupted(
                        page_id.0,
                        "leaf chain continues past the last leaf",
                    ));
                }
            }

            let leaf: LeafNode = self.read_node(page_id)?;
            if let (Some(prev), Some(first)) = (last_key, leaf.first_key()) {
                if prev > first {
                    return Err(Error::corrupted(
                        page_id.0,
                        format!("leaf starts at {} after a leaf ending at {}", first, prev),
                    ));
                }
            }
            last_key = leaf.entries().last().map(|e| e.key);

            position += 1;
            current = leaf.next();
        }

        if position != leaves.len() {
            return Err(Error::corrupted(
                leaves[position.saturating_sub(1)].0,
                format!(
                    "leaf chain ends after {} of {} leaves",
                    position,
                    leaves.len()
                ),
            ));
        }
        Ok(())
    }
}
