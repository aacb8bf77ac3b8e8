use thiserror::Error;

/// 单次心跳调用的失败结果
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeatError {
    /// 注册中心不认识该实例（例如注册中心重启过），需要重新注册
    #[error("Instance not found in registry: {instance_id}")]
    NotFound { instance_id: String },

    /// 网络错误、服务端 5xx、超时等，按固定周期重试
    #[error("Transient heartbeat failure: {0}")]
    Transient(String),
}

impl BeatError {
    pub fn not_found(instance_id: impl Into<String>) -> Self {
        Self::NotFound {
            instance_id: instance_id.into(),
        }
    }

    pub fn transient(cause: impl ToString) -> Self {
        Self::Transient(cause.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
