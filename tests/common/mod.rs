//! 测试辅助工具
//!
//! 内存存储、原生目录树和 tar 归档的构建函数

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vfe::{EngineResolver, FileInfo, HandlerGuard, MemoryFileStore, MemoryHandler};

/// 独立解析器 + 挂载在其上的内存存储
pub struct MemoryFixture {
    pub resolver: EngineResolver,
    pub store: Arc<MemoryFileStore>,
    _guard: HandlerGuard,
}

/// 创建内存夹具；`files` 中的路径以给定内容写入
pub fn memory_fixture(files: &[(&str, &[u8])]) -> MemoryFixture {
    let resolver = EngineResolver::isolated();
    let store = Arc::new(MemoryFileStore::new());
    for (path, content) in files {
        store.write_file(path, content).unwrap();
    }
    let guard = resolver.registry().register(MemoryHandler::new(Arc::clone(&store)));
    MemoryFixture {
        resolver,
        store,
        _guard: guard,
    }
}

/// 在临时目录中创建文件树；以 `/` 结尾的条目创建为目录
pub fn native_tree(entries: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for entry in entries {
        let path = dir.path().join(entry.trim_end_matches('/'));
        if entry.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, entry.as_bytes()).unwrap();
        }
    }
    dir
}

/// 用 `tar::Builder` 构建归档，返回归档路径
pub fn build_tar(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> String {
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    let mut builder = tar::Builder::new(file);
    for (member, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        header.set_cksum();
        builder.append_data(&mut header, member, *content).unwrap();
    }
    builder.into_inner().unwrap();
    path.to_string_lossy().into_owned()
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// 条目路径相对 `root`，排序后返回
pub fn relative_paths<I: IntoIterator<Item = FileInfo>>(root: &str, entries: I) -> Vec<String> {
    let prefix = format!("{}/", root.trim_end_matches('/'));
    let mut paths: Vec<String> = entries
        .into_iter()
        .map(|info| {
            let path = info.file_path();
            path.strip_prefix(&prefix).unwrap_or(path).to_string()
        })
        .collect();
    paths.sort();
    paths
}
