//! Page store I/O statistics.

use std::fmt;

/// Counters kept by every [`PageStore`](super::PageStore).
///
/// Stores are single-threaded and mutated through `&mut self`, so plain
/// counters suffice; callers receive a copy.
///
/// # Example
/// ```
/// use treeindex::storage::IoStats;
///
/// let mut stats = IoStats::default();
/// stats.pages_read += 3;
/// assert_eq!(stats.total_io(), 3);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IoStats {
    /// Number of pages read.
    pub pages_read: u64,

    /// Number of pages written (allocation excluded).
    pub pages_written: u64,

    /// Number of pages appended to the store.
    pub pages_allocated: u64,
}

impl IoStats {
    /// Reads plus writes plus allocations.
    pub fn total_io(&self) -> u64 {
        self.pages_read + self.pages_written + self.pages_allocated
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for IoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IoStats {{ read: {}, written: {}, allocated: {} }}",
            self.pages_read, self.pages_written, self.pages_allocated
        )
    }
}
