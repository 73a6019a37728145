//! 日志初始化

use log::LevelFilter;

/// 控制日志级别的环境变量（env_logger 过滤语法，如 `debug` 或 `mnist_track=debug`）
pub const LOG_ENV: &str = "MNIST_TRACK_LOG";

/// 初始化全局日志：默认 Info，第三方 HTTP/TLS 库只输出 Warn 及以上
///
/// 可重复调用，已初始化时静默忽略。
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Info)
        .filter_module("ureq", LevelFilter::Warn)
        .filter_module("rustls", LevelFilter::Warn)
        .parse_env(env_logger::Env::new().filter(LOG_ENV))
        .try_init();
}
