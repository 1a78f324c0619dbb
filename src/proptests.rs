use super::*;

use crate::key::encode_u64;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Low bits of a record hold a version; the key id lives above them.
const VERSION_BITS: u32 = 16;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 8)]
    Insert(#[proptest(strategy = "0u64..2048")] u64),
    #[proptest(weight = 4)]
    Upsert(#[proptest(strategy = "0u64..2048")] u64),
    #[proptest(weight = 4)]
    Erase(#[proptest(strategy = "0u64..2048")] u64),
    #[proptest(weight = 4)]
    Get(#[proptest(strategy = "0u64..2048")] u64),
    #[proptest(weight = 2)]
    Scan(
        #[proptest(strategy = "0u64..2048")] u64,
        #[proptest(strategy = "0usize..40")] usize,
    ),
    #[proptest(weight = 1)]
    Merge,
}

fn short_key(id: u64) -> Vec<u8> {
    encode_u64(id).to_vec()
}

/// 31-byte keys sharing long runs, so prefixes exceed the inline capacity.
fn long_key(id: u64) -> Vec<u8> {
    let mut key = vec![0x11; 31];
    key[3] = (id >> 10) as u8;
    key[29] = ((id >> 5) & 31) as u8;
    key[30] = (id & 31) as u8;
    key
}

/// Reference model: two maps mirroring the two layers.
#[derive(Default)]
struct Model {
    dynamic: BTreeMap<Vec<u8>, u64>,
    frozen: BTreeMap<Vec<u8>, u64>,
}

impl Model {
    fn get(&self, key: &[u8]) -> Option<u64> {
        self.dynamic.get(key).or_else(|| self.frozen.get(key)).copied()
    }

    fn merge(&mut self) {
        let dynamic = std::mem::take(&mut self.dynamic);
        self.frozen.extend(dynamic);
    }

    fn merge_if_due(&mut self, config: &Config) {
        let pending = self.dynamic.len();
        if config.auto_merge && pending > config.merge_threshold && pending * config.merge_ratio > self.frozen.len() {
            self.merge();
        }
    }

    fn scan(&self, key: &[u8], count: usize) -> Vec<u64> {
        let mut visible = self.frozen.clone();
        visible.extend(self.dynamic.iter().map(|(k, v)| (k.clone(), *v)));
        visible.range(key.to_vec()..).take(count).map(|(_, v)| *v).collect()
    }
}

fn check_integrity<L: LoadKey>(index: &HybridIndex<L>) {
    let issues = index.dynamic().verify_integrity_with(index.loader());
    assert!(issues.is_empty(), "dynamic tree: {:?}", issues);
    let issues = index.frozen().verify_integrity_with(index.loader());
    assert!(issues.is_empty(), "static tree: {:?}", issues);
}

fn run_ops(ops: Vec<Op>, config: Config, make_key: fn(u64) -> Vec<u8>) -> std::result::Result<(), TestCaseError> {
    let key_len = config.key_len;
    let loader = move |record: u64, out: &mut [u8]| {
        out.copy_from_slice(&make_key(record >> VERSION_BITS));
    };
    let mut index = HybridIndex::with_config(config.clone(), loader).unwrap();
    let mut model = Model::default();
    let mut version = 0u64;
    let mut record_for = |id: u64| {
        version = (version + 1) % (1 << VERSION_BITS);
        (id << VERSION_BITS) | version
    };

    for op in ops {
        match op {
            Op::Insert(id) => {
                let key = make_key(id);
                let record = record_for(id);
                model.merge_if_due(&config);
                let expected = !model.dynamic.contains_key(&key);
                if expected {
                    model.dynamic.insert(key.clone(), record);
                }
                prop_assert_eq!(index.insert(&key, record), expected);
            }
            Op::Upsert(id) => {
                let key = make_key(id);
                let record = record_for(id);
                model.merge_if_due(&config);
                model.dynamic.insert(key.clone(), record);
                index.upsert(&key, record);
            }
            Op::Erase(id) => {
                let key = make_key(id);
                prop_assert_eq!(index.erase(&key), model.dynamic.remove(&key).is_some());
            }
            Op::Get(id) => {
                let key = make_key(id);
                prop_assert_eq!(index.get(&key), model.get(&key));
                prop_assert_eq!(index.get_pessimistic(&key), model.get(&key));
            }
            Op::Scan(id, count) => {
                let key = make_key(id);
                prop_assert_eq!(index.scan(&key, count), model.scan(&key, count));
            }
            Op::Merge => {
                index.merge();
                model.merge();
                check_integrity(&index);
            }
        }
        prop_assert_eq!(index.dynamic_len(), model.dynamic.len());
        prop_assert_eq!(index.static_len(), model.frozen.len());
    }

    check_integrity(&index);
    prop_assert_eq!(index.iter().collect::<Vec<_>>(), model.scan(&vec![0; key_len], usize::MAX));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_short_keys(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        run_ops(ops, Config::default(), short_key)?;
    }

    #[test]
    fn prop_equivalence_long_keys(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let config = Config { key_len: 31, ..Config::default() };
        run_ops(ops, config, long_key)?;
    }

    #[test]
    fn prop_equivalence_auto_merge(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let config = Config {
            auto_merge: true,
            merge_threshold: 32,
            merge_ratio: 2,
            ..Config::default()
        };
        run_ops(ops, config, short_key)?;
    }

    #[test]
    fn prop_dense_threshold_does_not_change_contents(
        ids in prop::collection::btree_set(0u64..4096, 0..600),
        threshold in 0usize..=256,
    ) {
        let config = Config { dense_threshold: threshold, ..Config::default() };
        let mut index = HybridIndex::with_config(config, |record: u64, out: &mut [u8]| {
            out.copy_from_slice(&encode_u64(record));
        }).unwrap();
        for &id in &ids {
            index.insert(&encode_u64(id), id);
        }
        index.merge();
        check_integrity(&index);
        prop_assert_eq!(index.iter().collect::<Vec<_>>(), ids.iter().copied().collect::<Vec<_>>());
        for &id in &ids {
            prop_assert_eq!(index.get(&encode_u64(id)), Some(id));
        }
    }
}
