use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::shard::{Shard, fnv1_32};
use crate::config::DEFAULT_SHARD_COUNT;

/// 分片并发 map：键按哈希固定落到某个分片，每个分片一把读写锁
///
/// 单键操作在分片内是原子的；`len`/`keys`/`items`/`iterate` 逐个分片加锁，
/// 得到的不是全局一致快照。
///
/// `upsert`、`remove_if` 的回调和 `iterate` 的回调在持有分片锁时执行，
/// 回调内不得再访问同一个 map，锁不可重入，会死锁。
#[derive(Debug)]
pub struct ShardedMap<V> {
    shards: Box<[Shard<V>]>,
}

impl<V> Default for ShardedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ShardedMap<V> {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARD_COUNT)
    }

    /// 指定分片数创建，0 按默认值处理
    pub fn with_shards(shard_count: usize) -> Self {
        let shard_count = if shard_count == 0 {
            DEFAULT_SHARD_COUNT
        } else {
            shard_count
        };
        let shards = (0..shard_count).map(|_| Shard::new()).collect();
        Self { shards }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// 键所在分片的下标
    pub fn shard_index(&self, key: &str) -> usize {
        fnv1_32(key) as usize % self.shards.len()
    }

    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }

    /// 插入或覆盖
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.shard(&key).write().insert(key, value);
    }

    /// 批量插入，每个键单独加锁
    pub fn mset<K, I>(&self, entries: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// 键不存在时插入，返回是否插入成功
    pub fn set_if_absent(&self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        let mut items = self.shard(&key).write();
        if items.contains_key(&key) {
            return false;
        }
        items.insert(key, value);
        true
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.shard(key).read().contains_key(key)
    }

    pub fn remove(&self, key: &str) {
        self.shard(key).write().remove(key);
    }

    /// 条件删除：`predicate` 在写锁内对现有值求值，返回 true 时删除
    pub fn remove_if<F>(&self, key: &str, predicate: F) -> bool
    where
        F: FnOnce(&V) -> bool,
    {
        let mut items = self.shard(key).write();
        match items.get(key) {
            Some(value) if predicate(value) => {
                items.remove(key);
                true
            }
            _ => false,
        }
    }

    /// 读取并删除
    pub fn pop(&self, key: &str) -> Option<V> {
        self.shard(key).write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            keys.extend(shard.read().keys().cloned());
        }
        keys
    }

    /// 对每个条目调用回调，同一分片内的条目在同一次读锁下访问
    pub fn iterate<F>(&self, mut callback: F)
    where
        F: FnMut(&str, &V),
    {
        for shard in self.shards.iter() {
            let items = shard.read();
            for (key, value) in items.iter() {
                callback(key, value);
            }
        }
    }
}

impl<V: Clone> ShardedMap<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        self.shard(key).read().get(key).cloned()
    }

    /// 插入或更新：`combine(existing, new)` 在写锁内计算最终值并写回
    pub fn upsert<F>(&self, key: impl Into<String>, value: V, combine: F) -> V
    where
        F: FnOnce(Option<&V>, V) -> V,
    {
        let key = key.into();
        let mut items = self.shard(&key).write();
        let merged = combine(items.get(&key), value);
        items.insert(key, merged.clone());
        merged
    }

    /// 所有条目的拷贝，逐分片复制后合并
    pub fn items(&self) -> HashMap<String, V> {
        let mut snapshot = HashMap::with_capacity(self.len());
        for shard in self.shards.iter() {
            let items = shard.read();
            snapshot.extend(items.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        snapshot
    }
}

impl<V: Serialize> Serialize for ShardedMap<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        for shard in self.shards.iter() {
            let items = shard.read();
            for (key, value) in items.iter() {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
