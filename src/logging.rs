// ==========================================
// BOM 生产引擎 - 日志初始化
// ==========================================
// 日志统一写 stderr: CLI 的 stdout 只输出 JSON 结果
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化 CLI 日志
///
/// RUST_LOG 控制过滤（默认 info）,如 `RUST_LOG=bom_engine::engine=debug`
/// 可单独查看解析/扣料的逐层过程
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化 JSON 格式日志（供日志采集使用）
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_current_span(false)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
