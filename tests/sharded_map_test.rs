use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use registry_heartbeat::ShardedMap;

#[test]
fn test_set_get_remove_round_trip() {
    let map = ShardedMap::new();

    map.set("order-service:10.0.0.1:8080", 7u64);
    assert_eq!(map.get("order-service:10.0.0.1:8080"), Some(7));
    assert!(map.contains_key("order-service:10.0.0.1:8080"));

    // 覆盖写
    map.set("order-service:10.0.0.1:8080", 8u64);
    assert_eq!(map.get("order-service:10.0.0.1:8080"), Some(8));

    map.remove("order-service:10.0.0.1:8080");
    assert_eq!(map.get("order-service:10.0.0.1:8080"), None);
    assert!(!map.contains_key("order-service:10.0.0.1:8080"));

    // 删除不存在的键是空操作
    map.remove("missing");
    assert!(map.is_empty());
}

#[test]
fn test_set_if_absent_single_winner_under_race() {
    let map = Arc::new(ShardedMap::<usize>::new());
    let winners = Arc::new(AtomicUsize::new(0));
    let racers = 16;
    let barrier = Arc::new(Barrier::new(racers));

    let handles: Vec<_> = (0..racers)
        .map(|i| {
            let map = Arc::clone(&map);
            let winners = Arc::clone(&winners);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if map.set_if_absent("contended", i) {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_eq!(map.len(), 1);
    assert!(map.get("contended").is_some());
}

fn append(existing: Option<&Vec<u32>>, new: Vec<u32>) -> Vec<u32> {
    match existing {
        Some(old) => old.iter().copied().chain(new).collect(),
        None => new,
    }
}

#[test]
fn test_upsert_combines_with_existing_value() {
    let map: ShardedMap<Vec<u32>> = ShardedMap::new();

    assert_eq!(map.upsert("k", vec![1], append), vec![1]);
    assert_eq!(map.upsert("k", vec![2], append), vec![1, 2]);
    assert_eq!(map.get("k"), Some(vec![1, 2]));
}

#[test]
fn test_pop_reads_then_deletes() {
    let map = ShardedMap::new();
    map.set("k", "v".to_string());

    assert_eq!(map.pop("k"), Some("v".to_string()));
    assert_eq!(map.pop("k"), None);
    assert!(!map.contains_key("k"));
}

#[test]
fn test_remove_if_checks_predicate() {
    let map = ShardedMap::new();
    map.set("k", 2u32);

    assert!(!map.remove_if("k", |v| *v == 1));
    assert_eq!(map.get("k"), Some(2));

    assert!(map.remove_if("k", |v| *v == 2));
    assert_eq!(map.get("k"), None);

    assert!(!map.remove_if("missing", |_| true));
}

#[test]
fn test_enumeration_covers_every_shard() {
    let map = ShardedMap::<i32>::with_shards(4);
    map.mset((0..50).map(|i| (format!("key-{i}"), i)));

    assert_eq!(map.len(), 50);

    let mut keys = map.keys();
    keys.sort();
    let mut expected: Vec<String> = (0..50).map(|i| format!("key-{i}")).collect();
    expected.sort();
    assert_eq!(keys, expected);

    let items = map.items();
    assert_eq!(items.len(), 50);
    assert_eq!(items.get("key-42"), Some(&42));

    let mut seen = HashMap::new();
    map.iterate(|key, value| {
        seen.insert(key.to_string(), *value);
    });
    assert_eq!(seen, items);
}

#[test]
fn test_concurrent_writers_on_distinct_keys() {
    let map = Arc::new(ShardedMap::<usize>::new());
    let threads = 8;
    let per_thread = 500;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let key = format!("t{t}-{i}");
                    map.set(key.clone(), i);
                    assert_eq!(map.get(&key), Some(i));
                }
            })
        })
        .collect();

    // 写入期间读取计数不会失败，只是可能不精确
    let _ = map.len();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(map.len(), threads * per_thread);
}

#[test]
fn test_serializes_as_flat_object() {
    let map = ShardedMap::<i32>::new();
    map.set("a", 1);
    map.set("b", 2);

    let value = serde_json::to_value(&map).unwrap();
    assert_eq!(value, serde_json::json!({ "a": 1, "b": 2 }));

    let empty: ShardedMap<i32> = ShardedMap::new();
    assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
}
