use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use tokio::sync::{Mutex, Semaphore};
use tokio_util::task::TaskTracker;

use super::beater::Beater;
use super::error::BeatError;
use super::types::{BeatRecord, InstanceInfo, InstanceRecord, InstanceStatus, SchedulerStats};
use crate::config::HeartbeatConfig;
use crate::services::shard_map::ShardedMap;

pub(super) struct SchedulerInner {
    // 实例ID -> 正在心跳的实例
    pub(super) live: ShardedMap<Arc<InstanceRecord>>,
    // 实例ID -> 最近一次心跳成功
    pub(super) beat_records: ShardedMap<BeatRecord>,
    // 全局在途心跳数限制
    pub(super) limiter: Semaphore,
    pub(super) beater: Arc<dyn Beater>,
    pub(super) period: Duration,
    max_concurrent: usize,
    shutdown_timeout: Duration,
    // 串行化注册/注销，以及心跳成功后的记录写入
    pub(super) registration_lock: Mutex<()>,
    next_generation: AtomicU64,
    pub(super) task_tracker: TaskTracker,
}

/// 心跳调度器：每个注册的实例一个后台任务，所有任务共享一个并发上限
#[derive(Clone)]
pub struct HeartbeatScheduler {
    pub(super) inner: Arc<SchedulerInner>,
}

impl fmt::Debug for HeartbeatScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeartbeatScheduler")
            .field("period", &self.inner.period)
            .field("max_concurrent", &self.inner.max_concurrent)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl HeartbeatScheduler {
    pub fn new(config: &HeartbeatConfig, beater: Arc<dyn Beater>) -> Self {
        let max_concurrent = config.max_concurrent();
        let inner = SchedulerInner {
            live: ShardedMap::with_shards(config.shards()),
            beat_records: ShardedMap::with_shards(config.shards()),
            limiter: Semaphore::new(max_concurrent),
            beater,
            period: config.period(),
            max_concurrent,
            shutdown_timeout: config.shutdown_timeout(),
            registration_lock: Mutex::new(()),
            next_generation: AtomicU64::new(0),
            task_tracker: TaskTracker::new(),
        };

        tracing::debug!(
            period_secs = inner.period.as_secs(),
            max_concurrent,
            shards = config.shards(),
            "Heartbeat scheduler created"
        );

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// 注册实例并开始心跳；同一实例已存在时替换旧记录，旧任务在下一轮检查时退出
    pub async fn add_instance(&self, info: InstanceInfo) {
        if info.instance_id.is_empty() {
            tracing::error!(app = %info.app, "Refusing to beat an instance without instance id");
            return;
        }
        if self.inner.limiter.is_closed() {
            tracing::warn!(
                instance_id = %info.instance_id,
                "Heartbeat scheduler is shut down, ignoring instance"
            );
            return;
        }

        let _guard = self.inner.registration_lock.lock().await;
        // shutdown 可能在上面的检查之后、拿到锁之前完成
        if self.inner.limiter.is_closed() {
            tracing::warn!(
                instance_id = %info.instance_id,
                "Heartbeat scheduler shut down while registering, ignoring instance"
            );
            return;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let record = Arc::new(InstanceRecord::new(info, generation));
        let key = record.key().to_string();

        if let Some(stale) = self.inner.live.pop(&key) {
            stale.set_status(InstanceStatus::Superseded);
            tracing::info!(
                instance_id = %key,
                stale_generation = stale.generation(),
                generation,
                "Replacing existing heartbeat for instance"
            );
        }

        self.inner.live.set(key.clone(), Arc::clone(&record));

        tracing::info!(
            instance_id = %key,
            app = %record.info().app,
            generation,
            "Registered instance for heartbeat"
        );

        self.spawn_beat_task(record);
    }

    /// 停止某个实例的心跳；任务最迟在一个周期后退出，不等待
    pub async fn remove_instance(&self, instance_id: &str) -> bool {
        let _guard = self.inner.registration_lock.lock().await;

        let removed = match self.inner.live.pop(instance_id) {
            Some(record) => {
                record.set_status(InstanceStatus::Removed);
                true
            }
            None => false,
        };
        self.inner.beat_records.remove(instance_id);

        if removed {
            tracing::info!(instance_id = %instance_id, "Removed instance from heartbeat map");
        } else {
            tracing::debug!(instance_id = %instance_id, "Instance was not beating");
        }
        removed
    }

    /// 绕过调度直接发一次心跳，用于连通性检测
    pub async fn beat_now(&self, info: &InstanceInfo) -> Result<(), BeatError> {
        let _permit = self
            .inner
            .limiter
            .acquire()
            .await
            .map_err(|_| BeatError::transient("heartbeat scheduler is shut down"))?;

        let result = self.inner.beater.beat(info).await;
        match &result {
            Ok(()) => {
                tracing::debug!(instance_id = %info.instance_id, "Connection detection succeeded")
            }
            Err(e) => tracing::warn!(
                instance_id = %info.instance_id,
                error = %e,
                "Connection detection failed"
            ),
        }
        result
    }

    pub fn instance_status(&self, instance_id: &str) -> Option<InstanceStatus> {
        self.inner.live.get(instance_id).map(|record| record.status())
    }

    pub fn is_beating(&self, instance_id: &str) -> bool {
        self.instance_status(instance_id) == Some(InstanceStatus::Up)
    }

    /// 所有实例的状态快照
    pub fn instances(&self) -> HashMap<String, InstanceStatus> {
        let mut statuses = HashMap::new();
        self.inner.live.iterate(|key, record| {
            statuses.insert(key.to_string(), record.status());
        });
        statuses
    }

    pub fn beat_record(&self, instance_id: &str) -> Option<BeatRecord> {
        self.inner.beat_records.get(instance_id)
    }

    pub fn last_beat_time(&self, instance_id: &str) -> Option<SystemTime> {
        self.beat_record(instance_id).map(|record| record.last_beat)
    }

    /// 心跳记录表，可直接序列化导出
    pub fn export_beat_records(&self) -> &ShardedMap<BeatRecord> {
        &self.inner.beat_records
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            registered_instances: self.inner.live.len(),
            in_flight_beats: self
                .inner
                .max_concurrent
                .saturating_sub(self.inner.limiter.available_permits()),
            running_tasks: self.inner.task_tracker.len(),
        }
    }

    /// 关闭调度器：关闭并发限制、标记所有实例为已移除，并在超时内等待任务退出
    pub async fn shutdown(&self) -> bool {
        self.inner.limiter.close();

        {
            let _guard = self.inner.registration_lock.lock().await;
            for key in self.inner.live.keys() {
                if let Some(record) = self.inner.live.pop(&key) {
                    record.set_status(InstanceStatus::Removed);
                }
            }
        }

        self.inner.task_tracker.close();
        let timeout = self.inner.shutdown_timeout;
        match tokio::time::timeout(timeout, self.inner.task_tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Heartbeat scheduler drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    running_tasks = self.inner.task_tracker.len(),
                    timeout_secs = timeout.as_secs(),
                    "Heartbeat tasks still running after shutdown timeout"
                );
                false
            }
        }
    }
}
