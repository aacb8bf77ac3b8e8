use tracing_subscriber::EnvFilter;

// LOG_LEVEL 取值映射到过滤级别，未知值按 info 处理
fn level_from_env() -> &'static str {
    match std::env::var("LOG_LEVEL")
        .unwrap_or_default()
        .to_ascii_uppercase()
        .as_str()
    {
        "DEBUG" => "debug",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// 安装全局 tracing 订阅器。`RUST_LOG` 优先，其次 `LOG_LEVEL`。
///
/// 已经安装过订阅器时返回 `false`。
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_from_env()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
