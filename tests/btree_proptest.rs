//! Property tests: the index behaves like a sorted multimap.
//!
//! Every case runs against an in-memory page store and checks the tree
//! against a `BTreeMap<i32, Vec<RecordId>>` model.

use std::collections::BTreeMap;

use proptest::prelude::*;
use treeindex::{BTreeIndex, Cursor, IndexOptions, MemoryPageStore, OpenMode, RecordId};

type Model = BTreeMap<i32, Vec<RecordId>>;

fn build(
    leaf_capacity: usize,
    internal_capacity: usize,
    keys: &[i32],
) -> (BTreeIndex<MemoryPageStore>, Model) {
    let options = IndexOptions::new()
        .with_leaf_capacity(leaf_capacity)
        .with_internal_capacity(internal_capacity);
    let mut index =
        BTreeIndex::with_store(MemoryPageStore::new(), OpenMode::Write, options).unwrap();
    let mut model = Model::new();

    for (i, &key) in keys.iter().enumerate() {
        let rid = RecordId::new(i as u32, key as u32);
        index.insert(key, rid).unwrap();
        model.entry(key).or_default().push(rid);
    }
    (index, model)
}

fn model_entries(model: &Model) -> Vec<(i32, RecordId)> {
    model
        .iter()
        .flat_map(|(&k, rids)| rids.iter().map(move |&r| (k, r)))
        .collect()
}

fn keys_strategy() -> impl Strategy<Value = Vec<i32>> {
    prop_oneof![
        proptest::collection::vec(any::<i32>(), 0..400),
        // Narrow domain to force duplicates.
        proptest::collection::vec(-20..20i32, 0..400),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A full scan yields every inserted pair in key order, duplicates in
    /// insertion order.
    #[test]
    fn prop_scan_matches_model(
        leaf_cap in 2usize..8,
        internal_cap in 2usize..8,
        keys in keys_strategy(),
    ) {
        let (mut index, model) = build(leaf_cap, internal_cap, &keys);

        let scanned: Vec<(i32, RecordId)> = index
            .scan()
            .unwrap()
            .map(|e| e.map(|e| (e.key, e.record_id)).unwrap())
            .collect();
        prop_assert_eq!(scanned, model_entries(&model));

        let summary = index.check_integrity().unwrap();
        prop_assert_eq!(summary.entries, keys.len());
        prop_assert_eq!(summary.height, index.height());
    }

    /// `locate` lands on the first entry `>= key` and reports equality.
    #[test]
    fn prop_locate_is_lower_bound(
        leaf_cap in 2usize..6,
        keys in keys_strategy(),
        probes in proptest::collection::vec(any::<i32>(), 1..40),
    ) {
        let (mut index, model) = build(leaf_cap, 3, &keys);

        let extra: Vec<i32> = keys.iter().take(10).copied().collect();
        for probe in probes.into_iter().chain(extra) {
            let (cursor, found) = index.locate(probe).unwrap();
            let expected = model.range(probe..).next();

            match expected {
                None => {
                    prop_assert_eq!(cursor, Cursor::END);
                    prop_assert!(!found);
                }
                Some((&k, rids)) => {
                    let (entry, _) = index.read_forward(cursor).unwrap().unwrap();
                    prop_assert_eq!(entry.key, k);
                    prop_assert_eq!(entry.record_id, rids[0]);
                    prop_assert_eq!(found, k == probe);
                }
            }
        }
    }

    /// Range scans agree with the model for arbitrary bounds.
    #[test]
    fn prop_range_matches_model(
        keys in keys_strategy(),
        a in -30..30i32,
        b in -30..30i32,
    ) {
        let (mut index, model) = build(3, 3, &keys);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let got: Vec<i32> = index.range(lo..hi).unwrap().map(|e| e.unwrap().key).collect();
        let want: Vec<i32> = model
            .range(lo..hi)
            .flat_map(|(&k, rids)| std::iter::repeat(k).take(rids.len()))
            .collect();
        prop_assert_eq!(got, want);

        for key in [lo, hi] {
            let want = model.get(&key).cloned().unwrap_or_default();
            prop_assert_eq!(index.get(key).unwrap(), want);
        }
    }

    /// Height never exceeds what the minimum fan-out allows.
    #[test]
    fn prop_height_is_logarithmic(n in 1usize..600) {
        let keys: Vec<i32> = (0..n as i32).collect();
        let (index, _) = build(2, 2, &keys);

        // Leaves hold at least one entry, internal nodes at least two
        // children.
        let bound = 1 + (n as f64).log2().ceil() as u32;
        prop_assert!(index.height() <= bound);
    }
}
