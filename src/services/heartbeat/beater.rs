use async_trait::async_trait;

use super::error::BeatError;
use super::types::InstanceInfo;

/// 向注册中心发送一次心跳的能力
///
/// 调用需幂等，并自带超时；调度器不会额外加超时。
#[async_trait]
pub trait Beater: Send + Sync + 'static {
    async fn beat(&self, instance: &InstanceInfo) -> Result<(), BeatError>;
}
