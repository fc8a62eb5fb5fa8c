//! Page identifier type.

use std::fmt;

/// Identifies a page in an index file.
///
/// Using `u32` allows for 4 billion pages:
/// - 4,294,967,296 pages × 4KB = 16TB maximum index size
///
/// Page 0 ([`PageId::ROOT`]) is the fixed slot of the tree's root node.
/// Because the root slot can never be the target of a leaf chain link,
/// the on-disk value `0` doubles as "no next leaf" (see [`PageId::encode_link`]).
///
/// # Example
/// ```
/// use treeindex::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert!(!page_id.is_root());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// The page holding the current root node.
    pub const ROOT: PageId = PageId(0);

    /// Invalid/sentinel page ID.
    ///
    /// Used in memory to represent "no page", e.g. by the end cursor.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Check if this is the root slot.
    #[inline]
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    /// Encode an optional link (next leaf pointer) as stored on disk.
    #[inline]
    pub fn encode_link(link: Option<PageId>) -> u32 {
        link.map_or(0, |pid| pid.0)
    }

    /// Decode an on-disk link; `0` means no link.
    #[inline]
    pub fn decode_link(raw: u32) -> Option<PageId> {
        if raw == 0 {
            None
        } else {
            Some(PageId(raw))
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
