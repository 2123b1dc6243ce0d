//! 全局配置与便捷构造函数测试
//!
//! 全局配置只能初始化一次，因此本文件只有一个测试入口。

mod common;

use common::path_str;
use std::path::Path;
use tempfile::TempDir;
use vfe::{config, Config, DirFilters, FileInfo, MemoryHandler, VirtualFileSystem, Vfs};

#[test]
fn test_global_configuration_drives_defaults() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("vfe.json");
    std::fs::write(
        &file,
        r#"{
            "log": { "global": "warn", "iterator": "debug" },
            "iteration": { "max_depth": 0 },
            "memory": { "default_user_id": 1000, "users": { "1000": "alice" } },
            "archive": { "suffixes": [".tar", ".pack"] }
        }"#,
    )
    .unwrap();

    assert!(!config::is_initialized());
    config::init_from_file(&file).unwrap();
    assert!(config::is_initialized());
    assert_eq!(config::config().log.global, "warn");
    assert!(config::try_init(Config::default()).is_err());
    vfe::logger::init_test_logger();

    // memory store defaults
    let store = std::sync::Arc::new(vfe::memory_store());
    let mut vfs = Vfs::new(vfe::EngineResolver::isolated());
    vfs.mount(MemoryHandler::new(std::sync::Arc::clone(&store)));
    vfs.write_file(Path::new("/home/notes"), b"n").unwrap();
    let info: FileInfo = vfs.file_info("/home/notes");
    assert_eq!(info.owner_id(), Some(1000));
    assert_eq!(info.owner(), Some("alice"));

    // configured archive suffixes
    let handler = vfe::archive_handler();
    let archive = common::build_tar(dir.path(), "bundle.pack", &[("inside.txt", b"x")]);
    assert!(vfe::EngineHandler::create(&handler, &format!("{archive}/inside.txt")).is_some());

    // configured iteration depth: children of the root only
    std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
    let root = path_str(dir.path());
    let names: Vec<String> = vfe::iter(&root, DirFilters::DIRS | DirFilters::NO_DOT_AND_DOT_DOT)
        .map(|info| info.file_name().to_string())
        .collect();
    assert_eq!(names, ["a"]);
}
