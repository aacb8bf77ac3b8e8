use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: i64 = 5;
pub const DEFAULT_MAX_CONCURRENT_BEATS: usize = 20;
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid environment config: {0}")]
    Env(#[from] envy::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    heartbeat: HeartbeatConfig,
}

/// 心跳调度器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// 心跳间隔（秒），非正数时回退为 5 秒
    pub heartbeat_interval_secs: i64,
    /// 同时在途的心跳请求上限
    pub max_concurrent_beats: usize,
    /// 并发 map 的分片数，进程启动后不可更改
    pub shard_count: usize,
    /// 关闭时等待任务退出的时长，0 表示一个心跳周期
    pub shutdown_timeout_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            max_concurrent_beats: DEFAULT_MAX_CONCURRENT_BEATS,
            shard_count: DEFAULT_SHARD_COUNT,
            shutdown_timeout_secs: 0,
        }
    }
}

impl HeartbeatConfig {
    /// 从 TOML 文件的 `[heartbeat]` 表加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(config_str)?;
        Ok(file.heartbeat)
    }

    /// 从 `HEARTBEAT_*` 环境变量加载，存在 `.env` 时先读入
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Ok(envy::prefixed("HEARTBEAT_").from_env::<Self>()?)
    }

    /// 以秒为单位构造配置，其余字段取默认值
    pub fn with_interval_secs(heartbeat_interval_secs: i64) -> Self {
        Self {
            heartbeat_interval_secs,
            ..Default::default()
        }
    }

    pub fn period(&self) -> Duration {
        if self.heartbeat_interval_secs <= 0 {
            Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS as u64)
        } else {
            Duration::from_secs(self.heartbeat_interval_secs as u64)
        }
    }

    pub fn max_concurrent(&self) -> usize {
        if self.max_concurrent_beats == 0 {
            DEFAULT_MAX_CONCURRENT_BEATS
        } else {
            self.max_concurrent_beats
        }
    }

    pub fn shards(&self) -> usize {
        if self.shard_count == 0 {
            DEFAULT_SHARD_COUNT
        } else {
            self.shard_count
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        if self.shutdown_timeout_secs == 0 {
            self.period()
        } else {
            Duration::from_secs(self.shutdown_timeout_secs)
        }
    }
}
