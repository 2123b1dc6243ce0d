//! 路径规范化测试

use vfe::path::{
    base_name, clean_path_with, complete_suffix, file_name, is_absolute_path, is_relative_path,
    join, parent_path, suffix,
};
use vfe::{CleanFlags, EngineResolver, FileInfo};

fn posix(path: &str) -> String {
    clean_path_with(path, CleanFlags::empty())
}

#[test]
fn test_clean_is_idempotent() {
    for input in ["/a//b/./c/", "../x/../../y", "./foo/..", "/..", "a/b/../../..", ":/res//x/.."] {
        let once = posix(input);
        assert_eq!(posix(&once), once, "input {input:?}");
    }
}

#[test]
fn test_above_root_is_preserved() {
    assert_eq!(posix("/.."), "/..");
    assert_eq!(posix("/../"), "/../");
    assert_eq!(posix("/a/../.."), "/a/../..");
}

#[test]
fn test_dot_collapse() {
    assert_eq!(posix("foo/.."), ".");
    assert_eq!(posix("./foo/.."), ".");
    assert_eq!(posix("../a/.."), "..");
    assert_eq!(posix(""), "");
}

#[test]
fn test_resource_paths() {
    assert!(!is_relative_path(":/prefix/foo"));
    assert!(is_absolute_path(":/prefix/foo"));
    assert_eq!(posix(":/a/./b/../c"), ":/a/c");
    assert_eq!(parent_path(":/a"), ":/");
    assert_eq!(file_name(":/a/b.txt"), "b.txt");
}

#[test]
fn test_windows_syntax_behind_flags() {
    let all = CleanFlags::all();
    assert_eq!(clean_path_with("C:\\dir\\..\\x", all), "C:/x");
    assert_eq!(clean_path_with("//server/share/../other", all), "//server/other");
    assert_eq!(posix("//server/share/../other"), "/server/other");
}

#[test]
fn test_name_parts() {
    assert_eq!(join("/a", "b"), "/a/b");
    assert_eq!(join("/", "b"), "/b");
    assert_eq!(join("/a", "/abs"), "/abs");
    assert_eq!(base_name("/x/archive.tar.gz"), "archive");
    assert_eq!(suffix("/x/archive.tar.gz"), "gz");
    assert_eq!(complete_suffix("/x/archive.tar.gz"), "tar.gz");
}

#[test]
fn test_file_info_keeps_raw_path() {
    let info = FileInfo::with_resolver(EngineResolver::isolated(), "dir/./sub/name.txt");
    assert_eq!(info.file_path(), "dir/./sub/name.txt");
    assert_eq!(info.file_name(), "name.txt");
    assert!(info.is_relative());
}
