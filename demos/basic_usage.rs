//! Basic usage of the hybrid index.

use hybrid_art::key::{encode_u64, BigEndianU64};
use hybrid_art::{Config, HybridIndex, SharedIndex};

fn main() {
    example_hybrid_index();
    example_string_records();
    example_shared_index();
}

fn example_hybrid_index() {
    println!("=== HybridIndex (u64 keys) ===\n");

    let mut index = HybridIndex::new(BigEndianU64);
    for v in 0..1000u64 {
        index.insert(&encode_u64(v), v);
    }
    println!("find(500) = {:?}", index.get(&encode_u64(500)));
    println!("scan(500, 10) = {:?}", index.scan(&encode_u64(500), 10));

    index.erase(&encode_u64(500));
    println!("after erase, scan(499, 3) = {:?}", index.scan(&encode_u64(499), 3));

    let outcome = index.merge();
    println!("merged {} records ({} collisions)", outcome.items, outcome.collisions);
    println!("{:#?}\n", index.stats());
}

fn example_string_records() {
    println!("=== Records pointing into a table ===\n");

    // Keys live in the table; records are row numbers.
    let table: Vec<[u8; 12]> = ["apple", "banana", "cherry", "date", "elderberry"]
        .iter()
        .map(|name| {
            let mut key = [0u8; 12];
            key[..name.len()].copy_from_slice(name.as_bytes());
            key
        })
        .collect();
    let loader = |row: u64, out: &mut [u8]| out.copy_from_slice(&table[row as usize]);

    let config = Config {
        key_len: 12,
        ..Config::default()
    };
    let mut index = match HybridIndex::with_config(config, loader) {
        Ok(index) => index,
        Err(err) => {
            eprintln!("bad config: {err}");
            return;
        }
    };
    for (row, key) in table.iter().enumerate() {
        index.insert(key, row as u64);
    }
    index.merge();

    let mut probe = [0u8; 12];
    probe[0] = b'c';
    for row in index.lower_bound(&probe) {
        println!("{}", String::from_utf8_lossy(&table[row as usize]).trim_end_matches('\0'));
    }
    println!();
}

fn example_shared_index() {
    println!("=== SharedIndex (RwLock wrapper) ===\n");

    let config = Config {
        auto_merge: true,
        merge_threshold: 1000,
        ..Config::default()
    };
    let shared = match SharedIndex::with_config(config, BigEndianU64) {
        Ok(shared) => shared,
        Err(err) => {
            eprintln!("bad config: {err}");
            return;
        }
    };
    for v in 0..5000u64 {
        shared.insert(&encode_u64(v * 7), v * 7);
    }
    let stats = shared.stats();
    println!("dynamic: {}, static: {}", stats.dynamic_items, stats.static_items);
    println!("get(700) = {:?}", shared.get(&encode_u64(700)));
}
