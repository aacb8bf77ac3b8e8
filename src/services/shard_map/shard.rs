use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32 位 FNV-1 哈希（先乘后异或）
pub fn fnv1_32(key: &str) -> u32 {
    key.as_bytes().iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        hash.wrapping_mul(FNV_PRIME) ^ u32::from(*byte)
    })
}

// 单个分片：一把读写锁保护一个 HashMap
#[derive(Debug)]
pub(crate) struct Shard<V> {
    items: RwLock<HashMap<String, V>>,
}

impl<V> Shard<V> {
    pub(crate) fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    // 每个操作在持锁期间都保持 map 完整，锁中毒时直接取回内部数据
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, HashMap<String, V>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }
}
