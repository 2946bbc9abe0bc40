/// 日志工具模块
///
/// 嵌入方在启动时调用一次 [`init`] 即可获得与环境变量 `RUST_LOG`
/// 联动的结构化日志输出。
use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器（默认级别 info，可用 RUST_LOG 覆盖）
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // 重复初始化（例如多个测试）直接忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
