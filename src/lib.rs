pub mod config;
pub mod logging;
pub mod services;

pub use config::{ConfigError, HeartbeatConfig};
pub use services::heartbeat::{
    BeatError, BeatRecord, Beater, HeartbeatScheduler, InstanceInfo, InstanceStatus,
    SchedulerStats,
};
pub use services::shard_map::ShardedMap;
