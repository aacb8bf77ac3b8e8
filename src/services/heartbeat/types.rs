use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// 服务实例描述，`instance_id` 即心跳表的键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub instance_id: String,
    pub app: String,
    pub host_name: String,
    pub ip_addr: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl InstanceInfo {
    /// 应用名转小写，实例ID默认为 `app:ip:port`，主机名默认为 IP
    pub fn new(app: &str, ip_addr: &str, port: u16) -> Self {
        let app = app.to_lowercase();
        Self {
            instance_id: format!("{app}:{ip_addr}:{port}"),
            app,
            host_name: ip_addr.to_string(),
            ip_addr: ip_addr.to_string(),
            port,
            metadata: HashMap::new(),
        }
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = host_name.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// 心跳表中实例的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    /// 正在心跳
    Up,
    /// 同一实例被重新注册，旧任务应退出
    Superseded,
    /// 已注销或注册中心已不认识该实例
    Removed,
}

/// 心跳表中的一条记录，调用方和后台任务共享
#[derive(Debug)]
pub struct InstanceRecord {
    info: InstanceInfo,
    generation: u64,
    status: RwLock<InstanceStatus>,
}

impl InstanceRecord {
    pub(crate) fn new(info: InstanceInfo, generation: u64) -> Self {
        Self {
            info,
            generation,
            status: RwLock::new(InstanceStatus::Up),
        }
    }

    pub fn info(&self) -> &InstanceInfo {
        &self.info
    }

    pub fn key(&self) -> &str {
        &self.info.instance_id
    }

    /// 每次注册递增，用来区分同一键上的新旧记录
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> InstanceStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_up(&self) -> bool {
        self.status() == InstanceStatus::Up
    }

    pub(crate) fn set_status(&self, status: InstanceStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

/// 最近一次心跳成功的记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatRecord {
    pub last_beat: SystemTime,
    /// 累计成功次数
    pub beats: u64,
}

impl BeatRecord {
    pub(crate) fn first(now: SystemTime) -> Self {
        Self {
            last_beat: now,
            beats: 1,
        }
    }

    // upsert 回调：只做纯计算
    pub(crate) fn merge(existing: Option<&BeatRecord>, new: BeatRecord) -> BeatRecord {
        match existing {
            Some(old) => BeatRecord {
                last_beat: new.last_beat,
                beats: old.beats + new.beats,
            },
            None => new,
        }
    }

    pub fn last_beat_millis(&self) -> u128 {
        self.last_beat
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }
}

/// 调度器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub registered_instances: usize,
    pub in_flight_beats: usize,
    pub running_tasks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_defaults_follow_app_ip_port() {
        let info = InstanceInfo::new("Order-Service", "10.0.0.7", 8886);
        assert_eq!(info.app, "order-service");
        assert_eq!(info.instance_id, "order-service:10.0.0.7:8886");
        assert_eq!(info.host_name, "10.0.0.7");
    }

    #[test]
    fn merge_accumulates_beats() {
        let t0 = UNIX_EPOCH;
        let t1 = UNIX_EPOCH + std::time::Duration::from_millis(1500);
        let first = BeatRecord::merge(None, BeatRecord::first(t0));
        let second = BeatRecord::merge(Some(&first), BeatRecord::first(t1));
        assert_eq!(second.beats, 2);
        assert_eq!(second.last_beat_millis(), 1500);
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&InstanceStatus::Superseded).unwrap();
        assert_eq!(json, "\"SUPERSEDED\"");
    }
}
