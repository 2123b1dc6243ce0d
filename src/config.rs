//! 全局配置
//!
//! 线程安全的全局配置单例。配置的数据结构定义在 `vfe-config` 中，
//! 这里只负责保存和访问。
//!
//! # 使用示例
//! ```
//! use vfe::config::{config, init, Config};
//!
//! let mut cfg = Config::default();
//! cfg.log.global = "debug".into();
//!
//! init(cfg);
//! assert_eq!(config().log.global, "debug");
//! ```

use once_cell::sync::OnceCell;

pub use vfe_config::{
    ArchiveConfig, Component, Config, ConfigError, IterationConfig, LogConfig, MemoryStoreConfig,
    PathConfig,
};

static GLOBAL_CONFIG: OnceCell<Config> = OnceCell::new();

/// 初始化全局配置（只能调用一次）
///
/// # Panics
/// 如果配置已经初始化，会 panic
pub fn init(config: Config) {
    if GLOBAL_CONFIG.set(config).is_err() {
        panic!("Config already initialized");
    }
}

/// 尝试初始化全局配置；已初始化时原样返回传入的配置
pub fn try_init(config: Config) -> Result<(), Config> {
    GLOBAL_CONFIG.set(config)
}

/// 获取全局配置引用
///
/// # Panics
/// 如果配置未初始化，会 panic
pub fn config() -> &'static Config {
    match GLOBAL_CONFIG.get() {
        Some(config) => config,
        None => panic!("Config not initialized"),
    }
}

/// 获取全局配置；未初始化时返回 `None`
pub fn get() -> Option<&'static Config> {
    GLOBAL_CONFIG.get()
}

/// 检查配置是否已初始化
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

/// 从 JSON 文件加载配置并初始化
pub fn init_from_file(path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
    init(Config::from_json_file(path)?);
    Ok(())
}
