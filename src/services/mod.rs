pub mod heartbeat;
pub mod shard_map;
