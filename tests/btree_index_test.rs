//! End-to-end tests for the B+Tree index over a file.
//!
//! These follow the index through insert, split, reopen and scan using the
//! public API only.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

use tempfile::tempdir;
use treeindex::{
    BTreeIndex, Cursor, DiskManager, Error, IndexOptions, OpenMode, PageId, RecordId, PAGE_SIZE,
};

fn small_options(capacity: usize) -> IndexOptions {
    IndexOptions::new()
        .with_leaf_capacity(capacity)
        .with_internal_capacity(capacity)
        .with_sync_writes(false)
}

fn create_index(capacity: usize) -> (BTreeIndex<DiskManager>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.idx");
    let index = BTreeIndex::open_with_options(&path, OpenMode::Write, small_options(capacity))
        .unwrap();
    (index, dir)
}

fn rid(key: i32) -> RecordId {
    RecordId::new(key as u32, (key as u32) % 7)
}

fn collect_keys(index: &mut BTreeIndex<DiskManager>) -> Vec<i32> {
    index.scan().unwrap().map(|e| e.unwrap().key).collect()
}

/// The worked example: capacity 3, keys 5 3 8 1 9 2 7.
#[test]
fn test_small_capacity_scenario() {
    let (mut index, _dir) = create_index(3);

    for k in [5, 3, 8, 1, 9, 2, 7] {
        index.insert(k, rid(k)).unwrap();
    }

    assert_eq!(index.height(), 2);
    assert_eq!(collect_keys(&mut index), vec![1, 2, 3, 5, 7, 8, 9]);

    let (cursor, found) = index.locate(4).unwrap();
    assert!(!found);
    let (entry, _) = index.read_forward(cursor).unwrap().unwrap();
    assert_eq!(entry.key, 5);

    let (cursor, found) = index.locate(8).unwrap();
    assert!(found);
    let (entry, next) = index.read_forward(cursor).unwrap().unwrap();
    assert_eq!(entry.record_id, rid(8));
    let (entry, next) = index.read_forward(next).unwrap().unwrap();
    assert_eq!(entry.key, 9);
    assert_eq!(next, Cursor::END);

    let summary = index.check_integrity().unwrap();
    assert_eq!(summary.leaf_nodes, 3);
    assert_eq!(summary.entries, 7);
}

#[test]
fn test_empty_index() {
    let (mut index, _dir) = create_index(3);

    assert!(index.is_empty());
    assert_eq!(index.locate(42).unwrap(), (Cursor::END, false));
    assert!(index.read_forward(Cursor::END).unwrap().is_none());
    assert_eq!(index.scan().unwrap().count(), 0);
    assert_eq!(index.io_stats().pages_read, 0);
}

#[test]
fn test_reopen_preserves_contents() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reopen.idx");

    {
        let mut index =
            BTreeIndex::open_with_options(&path, OpenMode::Write, small_options(4)).unwrap();
        for k in (0..300).rev() {
            index.insert(k * 2, rid(k * 2)).unwrap();
        }
        index.close().unwrap();
    }

    {
        let mut index = BTreeIndex::open(&path, OpenMode::Read).unwrap();
        assert_eq!(index.leaf_capacity(), 4);
        assert_eq!(index.internal_capacity(), 4);
        assert!(index.height() >= 4);

        let keys = collect_keys(&mut index);
        assert_eq!(keys, (0..300).map(|k| k * 2).collect::<Vec<_>>());

        assert_eq!(index.get(150).unwrap(), vec![rid(150)]);
        assert!(index.get(151).unwrap().is_empty());

        assert!(matches!(index.insert(1, rid(1)), Err(Error::ReadOnly)));
    }
}

#[test]
fn test_reopen_for_write_continues_tree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grow.idx");

    for round in 0..3 {
        let mut index =
            BTreeIndex::open_with_options(&path, OpenMode::Write, small_options(5)).unwrap();
        for k in 0..50 {
            let key = k * 3 + round;
            index.insert(key, rid(key)).unwrap();
        }
        index.close().unwrap();
    }

    let mut index = BTreeIndex::open(&path, OpenMode::Read).unwrap();
    assert_eq!(collect_keys(&mut index), (0..150).collect::<Vec<_>>());
    assert_eq!(index.check_integrity().unwrap().entries, 150);
}

#[test]
fn test_open_missing_file_read_only() {
    let dir = tempdir().unwrap();
    let result = BTreeIndex::open(dir.path().join("missing.idx"), OpenMode::Read);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_duplicates_across_splits() {
    let (mut index, _dir) = create_index(3);

    for slot in 0..10u32 {
        index.insert(7, RecordId::new(1, slot)).unwrap();
    }
    index.insert(3, rid(3)).unwrap();
    index.insert(11, rid(11)).unwrap();

    let rids = index.get(7).unwrap();
    assert_eq!(rids.len(), 10);
    assert!(rids.iter().all(|r| r.page == 1));

    let (cursor, found) = index.locate(7).unwrap();
    assert!(found);
    let (entry, _) = index.read_forward(cursor).unwrap().unwrap();
    assert_eq!(entry.key, 7);

    index.check_integrity().unwrap();
}

#[test]
fn test_extreme_keys() {
    let (mut index, _dir) = create_index(3);

    for k in [0, i32::MAX, i32::MIN, -1, 1, i32::MAX - 1, i32::MIN + 1] {
        index.insert(k, rid(k)).unwrap();
    }

    assert_eq!(
        collect_keys(&mut index),
        vec![i32::MIN, i32::MIN + 1, -1, 0, 1, i32::MAX - 1, i32::MAX]
    );

    let (cursor, found) = index.locate(i32::MAX).unwrap();
    assert!(found);
    let (_, next) = index.read_forward(cursor).unwrap().unwrap();
    assert!(next.is_end());

    let tail: Vec<i32> = index
        .range(i32::MAX - 1..)
        .unwrap()
        .map(|e| e.unwrap().key)
        .collect();
    assert_eq!(tail, vec![i32::MAX - 1, i32::MAX]);
}

#[test]
fn test_dump_lists_every_node() {
    let (mut index, _dir) = create_index(3);
    for k in 0..20 {
        index.insert(k, rid(k)).unwrap();
    }

    let dump = index.dump().unwrap();
    let summary = index.check_integrity().unwrap();

    assert!(dump.starts_with("internal Page(0)"));
    let count = |kind: &str| {
        dump.lines()
            .filter(|l| l.trim_start().starts_with(kind))
            .count()
    };
    assert_eq!(count("leaf"), summary.leaf_nodes);
    assert_eq!(count("internal"), summary.internal_nodes);
}

#[test]
fn test_corrupted_page_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.idx");

    {
        let mut index =
            BTreeIndex::open_with_options(&path, OpenMode::Write, small_options(3)).unwrap();
        for k in 0..10 {
            index.insert(k, rid(k)).unwrap();
        }
        index.close().unwrap();
    }

    // Overwrite an unused payload byte of page 1.
    {
        let mut file = OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(PAGE_SIZE as u64 + 100)).unwrap();
        file.write_all(&[0xAB]).unwrap();
    }

    let mut index = BTreeIndex::open(&path, OpenMode::Read).unwrap();
    let err = index.scan().unwrap().find_map(|e| e.err()).unwrap();
    assert!(matches!(err, Error::ChecksumMismatch(1)));
}

#[test]
fn test_corrupted_root_rejected_on_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_root.idx");

    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        file.write_all(&[0u8; PAGE_SIZE]).unwrap();
    }

    // An all-zero page has a zero checksum field but a non-zero CRC.
    let result = BTreeIndex::open(&path, OpenMode::Read);
    assert!(matches!(result, Err(Error::ChecksumMismatch(0))));
}

#[test]
fn test_read_forward_rejects_bad_cursor() {
    let (mut index, _dir) = create_index(3);
    index.insert(1, rid(1)).unwrap();

    let result = index.read_forward(Cursor::new(PageId::ROOT, 5));
    assert!(matches!(result, Err(Error::InvalidCursor(_))));

    let result = index.read_forward(Cursor::new(PageId::new(40), 0));
    assert!(matches!(result, Err(Error::PageNotFound(40))));
}
