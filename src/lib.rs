//! vfe - pluggable virtual file engines
//!
//! Paths are served by file engines chosen per path: handlers registered
//! at run time claim the paths they understand (memory stores, mounted
//! archives, anything implementing [`EngineHandler`]), `:/` paths go to the
//! resource bundle and everything else to the native file system.
//!
//! # Architecture
//!
//! ```text
//! vfe-config/  - configuration data structures (serde)
//! vfe-core/    - engine contract, engines, handler chain, iteration
//! src/         - global configuration, logging, convenience constructors
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use vfe::{init, Config, DirFilters, IteratorFlags, MemoryHandler};
//!
//! init(Config::default());
//! let store = Arc::new(vfe::memory_store());
//! let _guard = vfe::HandlerRegistry::global().register(MemoryHandler::new(store));
//! for entry in vfe::iter("/", DirFilters::ALL_ENTRIES | DirFilters::NO_DOT_AND_DOT_DOT) {
//!     println!("{}", entry.file_path());
//! }
//! ```

pub mod config;
pub mod logger;

pub use config::{Component, Config, ConfigError};
pub use logger::{init_logger, LogFormat, LoggerError};
pub use vfe_core::{glob, path};
pub use vfe_core::{
    clean_path, is_relative_path, ArchiveEngine, ArchiveHandler, CleanFlags, Dir, DirFilters,
    DirIterable, DirIterator, EngineHandler, EngineResolver, EntryNames, File, FileEngine,
    FileFlags, FileInfo, FileName, FileOwner, FileTime, HandlerGuard, HandlerRegistry,
    IteratorFlags, MemoryEngine, MemoryFileStore, MemoryHandler, NativeEngine, OpenMode,
    ResourceBundle, ResourceEngine, SortFlags, SortKey, Vfs, VfsError, VfsResult,
    VirtualFileSystem,
};

/// 初始化全局配置（使用前先调用）
///
/// 只初始化配置，不初始化日志系统。
pub fn init(config: Config) {
    config::init(config);
}

/// 初始化配置和日志系统
pub fn init_with_logger(config: Config, format: LogFormat) -> Result<(), LoggerError> {
    config::init(config);
    logger::init_with_format(format)
}

/// Configuration in effect: the global one, or the defaults before `init`
fn current() -> Config {
    config::get().cloned().unwrap_or_default()
}

/// Process-wide resolver using the configured path syntax
pub fn default_resolver() -> EngineResolver {
    EngineResolver::global().with_path_config(&current().paths)
}

/// Empty memory store with the configured owner and permission defaults
pub fn memory_store() -> MemoryFileStore {
    MemoryFileStore::with_config(current().memory)
}

/// Archive handler mounting the configured suffixes
pub fn archive_handler() -> ArchiveHandler {
    ArchiveHandler::from_config(&current().archive)
}

/// Recursive iterator over `path` honoring the configured iteration
/// defaults
pub fn iter(path: &str, filters: DirFilters) -> DirIterator {
    DirIterator::from_config(default_resolver(), path, filters, &current().iteration)
}
