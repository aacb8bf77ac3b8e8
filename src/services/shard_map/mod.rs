//! Sharded concurrent map module
//!
//! - `shard`: a single lock-guarded bucket and the key hashing
//! - `map`: the `ShardedMap` facade spreading keys over a fixed set of shards

pub mod map;
pub mod shard;

pub use map::ShardedMap;
pub use shard::fnv1_32;
