//! 日志系统初始化
//!
//! 基于 `tracing` 和 `tracing-subscriber`，按组件（engine / registry /
//! iterator / path）分别控制日志级别。级别取自全局配置；配置未初始化时
//! 使用默认配置。
//!
//! # 使用示例
//! ```ignore
//! use vfe::config::{init, Config};
//! use vfe::logger::init_logger;
//!
//! init(Config::default());
//! init_logger().unwrap();
//! ```

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    Layer,
};

use crate::config::{self, Component, LogConfig};

/// 日志输出格式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    #[default]
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 日志初始化错误
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("cannot open log file '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// 级别名解析；无法识别的名称按 `info` 处理
fn parse_level(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::INFO)
}

/// 构建各组件的目标过滤器
pub fn targets(cfg: &LogConfig) -> Targets {
    Component::ALL.iter().fold(
        Targets::new().with_default(parse_level(&cfg.global)),
        |targets, component| {
            targets.with_target(component.target(), parse_level(cfg.level_for(*component)))
        },
    )
}

fn current_targets() -> Targets {
    match config::get() {
        Some(cfg) => targets(&cfg.log),
        None => targets(&LogConfig::default()),
    }
}

/// 初始化日志系统（默认格式，仅控制台）
pub fn init_logger() -> Result<(), LoggerError> {
    init_with_format(LogFormat::default())
}

/// 使用指定格式初始化日志系统
pub fn init_with_format(format: LogFormat) -> Result<(), LoggerError> {
    init_with_file(format, None::<&str>)
}

/// 使用文件输出初始化日志系统
///
/// # Arguments
/// * `format` - 控制台日志格式
/// * `file` - 日志文件路径，`None` 表示只输出到控制台；文件以追加方式写入
pub fn init_with_file<P: AsRef<Path>>(format: LogFormat, file: Option<P>) -> Result<(), LoggerError> {
    let targets = current_targets();
    let stdout_layer = create_format_layer(format, io::stdout).with_filter(targets.clone());

    match file {
        Some(path) => {
            let path = path.as_ref();
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggerError::File {
                    path: path.display().to_string(),
                    source,
                })?;
            // 文件层
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(handle))
                .with_filter(targets);
            tracing_subscriber::registry()
                .with(stdout_layer)
                .with(file_layer)
                .try_init()?;
        }
        None => {
            tracing_subscriber::registry().with(stdout_layer).try_init()?;
        }
    }
    Ok(())
}

/// 根据格式创建 formatter layer
fn create_format_layer<S, W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}

/// 为测试初始化简单日志（输出交给测试框架捕获）
pub fn init_test_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// 检查指定组件的 DEBUG 日志是否启用
#[inline]
pub fn is_enabled(component: Component) -> bool {
    match component {
        Component::Engine => tracing::enabled!(target: "vfe::engine", tracing::Level::DEBUG),
        Component::Registry => tracing::enabled!(target: "vfe::registry", tracing::Level::DEBUG),
        Component::Iterator => tracing::enabled!(target: "vfe::iterator", tracing::Level::DEBUG),
        Component::Path => tracing::enabled!(target: "vfe::path", tracing::Level::DEBUG),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_log_format_default() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARN"), LevelFilter::WARN);
        assert_eq!(parse_level("off"), LevelFilter::OFF);
        assert_eq!(parse_level("loud"), LevelFilter::INFO);
    }

    #[test]
    fn test_targets_per_component() {
        let cfg = LogConfig {
            global: "warn".into(),
            iterator: Some("trace".into()),
            ..Default::default()
        };
        let targets = targets(&cfg);
        assert!(targets.would_enable("vfe::iterator", &Level::TRACE));
        assert!(!targets.would_enable("vfe::engine", &Level::INFO));
        assert!(targets.would_enable("vfe::engine", &Level::WARN));
        assert!(!targets.would_enable("other", &Level::DEBUG));
    }

    #[test]
    fn test_log_file_error() {
        let err = init_with_file(LogFormat::Compact, Some("/definitely/missing/dir/vfe.log")).unwrap_err();
        assert!(matches!(err, LoggerError::File { .. }));
    }
}
