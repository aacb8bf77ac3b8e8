use std::sync::Arc;
use std::time::SystemTime;

use super::error::BeatError;
use super::scheduler::{HeartbeatScheduler, SchedulerInner};
use super::types::{BeatRecord, InstanceRecord, InstanceStatus};

impl HeartbeatScheduler {
    // 启动实例的心跳任务
    pub(super) fn spawn_beat_task(&self, record: Arc<InstanceRecord>) {
        let inner = Arc::clone(&self.inner);
        self.inner.task_tracker.spawn(run_beat_loop(inner, record));
    }
}

async fn run_beat_loop(inner: Arc<SchedulerInner>, record: Arc<InstanceRecord>) {
    let key = record.key();
    let generation = record.generation();

    loop {
        let permit = match inner.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(
                    instance_id = %key,
                    error = %e,
                    "Failed to acquire heartbeat slot, task exits"
                );
                return;
            }
        };

        // 实例已注销或被替换则停止心跳
        if !record.is_up() {
            drop(permit);
            tracing::info!(
                instance_id = %key,
                status = ?record.status(),
                "Instance stopped heartbeating"
            );
            return;
        }

        match inner.beater.beat(record.info()).await {
            Ok(()) => {
                // 持锁检查状态，避免在 remove_instance 清理之后重新写入记录
                let _guard = inner.registration_lock.lock().await;
                if record.is_up() {
                    inner.beat_records.upsert(
                        key,
                        BeatRecord::first(SystemTime::now()),
                        BeatRecord::merge,
                    );
                }
                tracing::debug!(instance_id = %key, "Heartbeat succeeded");
            }
            Err(BeatError::NotFound { .. }) => {
                // 只删除自己这一代的记录，重新注册的实例不受影响
                let removed = inner
                    .live
                    .remove_if(key, |current| current.generation() == generation);
                record.set_status(InstanceStatus::Removed);
                drop(permit);
                tracing::warn!(
                    instance_id = %key,
                    removed,
                    "Registry does not know this instance, heartbeat task exits"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(
                    instance_id = %key,
                    error = %e,
                    "Heartbeat failed, retrying next period"
                );
            }
        }

        drop(permit);
        tokio::time::sleep(inner.period).await;
    }
}
