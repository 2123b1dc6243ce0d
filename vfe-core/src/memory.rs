//! In-memory file engine
//!
//! Engines created by a [`MemoryHandler`] all work on one shared
//! [`MemoryFileStore`]: two engines opened on the same path see the same
//! record, and every read or write holds that record's lock for its
//! duration.

use crate::engine::{record_error, DirIterable, EngineHandler, EntryNames, FileEngine};
use crate::error::VfsError;
use crate::flags::{DirFilters, FileFlags, FileName, FileOwner, FileTime, OpenMode};
use crate::handle::FileHandle;
use crate::path;
use crate::store::{store_key, FileRecord, MemoryFileStore, NodeKind};
use std::sync::Arc;
use std::time::SystemTime;

/// Engine bound to one path of a [`MemoryFileStore`]
#[derive(Debug)]
pub struct MemoryEngine {
    store: Arc<MemoryFileStore>,
    name: String,
    handle: Option<FileHandle<Arc<FileRecord>>>,
    error: Option<VfsError>,
}

impl MemoryEngine {
    pub fn new(store: Arc<MemoryFileStore>, name: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
            handle: None,
            error: None,
        }
    }

    fn key(&self) -> String {
        store_key(&self.name)
    }

    fn fail(&mut self, err: VfsError) -> bool {
        record_error(&mut self.error, err)
    }

    fn outcome(&mut self, result: Result<(), VfsError>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => self.fail(err),
        }
    }

    /// Record of the open handle, or the one the path names right now
    fn record(&self) -> Option<Arc<FileRecord>> {
        match &self.handle {
            Some(handle) => Some(Arc::clone(handle.backing())),
            None => self.store.lookup(&self.name, true).map(|(_, record)| record),
        }
    }
}

/// Zero-extend `content` to `len` bytes; `false` when the allocation is
/// refused, leaving `content` untouched
fn grow(content: &mut Vec<u8>, len: usize) -> bool {
    let Some(extra) = len.checked_sub(content.len()) else {
        return true;
    };
    if content.try_reserve(extra).is_err() {
        return false;
    }
    content.resize(len, 0);
    true
}

impl FileEngine for MemoryEngine {
    fn open(&mut self, mode: OpenMode) -> bool {
        if self.handle.is_some() {
            return self.fail(VfsError::AlreadyOpen { path: self.name.clone() });
        }
        if mode.is_empty() {
            return self.fail(VfsError::invalid_argument(&self.name, "empty open mode"));
        }
        let create = (mode.is_writable() || mode.contains(OpenMode::NEW_ONLY))
            && !mode.contains(OpenMode::EXISTING_ONLY);
        let exclusive = mode.contains(OpenMode::NEW_ONLY);

        let record = match self.store.open_record(&self.name, create, exclusive) {
            Ok(record) => record,
            Err(err) => return self.fail(err),
        };

        let position = {
            let mut data = record.lock();
            if mode.truncates() {
                data.content.clear();
                data.touch();
            }
            if mode.contains(OpenMode::APPEND) {
                data.content.len() as i64
            } else {
                0
            }
        };
        self.handle = Some(FileHandle::new(mode, position, record));
        self.error = None;
        true
    }

    fn close(&mut self) -> bool {
        match self.handle.take() {
            Some(_) => true,
            None => self.fail(VfsError::not_open(&self.name)),
        }
    }

    fn flush(&mut self) -> bool {
        if self.handle.is_none() {
            return self.fail(VfsError::not_open(&self.name));
        }
        true
    }

    fn read(&mut self, buf: &mut [u8]) -> i64 {
        let outcome = match &mut self.handle {
            Some(handle) if handle.can_read() => {
                let record = Arc::clone(handle.backing());
                let mut data = record.lock();
                match handle.read_span(data.content.len(), buf.len()) {
                    Some(n) => {
                        let start = handle.position() as usize;
                        buf[..n].copy_from_slice(&data.content[start..start + n]);
                        data.accessed = SystemTime::now();
                        handle.advance(n);
                        Ok(n as i64)
                    }
                    None => Err(VfsError::OutOfRange {
                        path: self.name.clone(),
                        position: handle.position(),
                    }),
                }
            }
            Some(_) => Err(VfsError::invalid_argument(&self.name, "not open for reading")),
            None => Err(VfsError::not_open(&self.name)),
        };
        outcome.unwrap_or_else(|err| {
            self.fail(err);
            -1
        })
    }

    fn write(&mut self, data: &[u8]) -> i64 {
        let outcome = match &mut self.handle {
            Some(handle) if handle.can_write() => {
                let record = Arc::clone(handle.backing());
                let mut file = record.lock();
                if handle.mode().contains(OpenMode::APPEND) {
                    handle.set_position(file.content.len() as i64);
                }
                let position = handle.position();
                let span = usize::try_from(position)
                    .ok()
                    .and_then(|start| Some((start, start.checked_add(data.len())?)));
                // the span between the old end and `start` is not meaningful
                // content
                match span {
                    Some((start, end)) if grow(&mut file.content, end) => {
                        file.content[start..end].copy_from_slice(data);
                        file.touch();
                        handle.advance(data.len());
                        Ok(data.len() as i64)
                    }
                    _ => Err(VfsError::OutOfRange {
                        path: self.name.clone(),
                        position,
                    }),
                }
            }
            Some(_) => Err(VfsError::invalid_argument(&self.name, "not open for writing")),
            None => Err(VfsError::not_open(&self.name)),
        };
        outcome.unwrap_or_else(|err| {
            self.fail(err);
            -1
        })
    }

    fn pos(&self) -> i64 {
        self.handle.as_ref().map(FileHandle::position).unwrap_or(-1)
    }

    fn seek(&mut self, pos: i64) -> bool {
        if pos < 0 {
            return self.fail(VfsError::invalid_argument(&self.name, "negative position"));
        }
        match &mut self.handle {
            Some(handle) => {
                handle.set_position(pos);
                true
            }
            None => self.fail(VfsError::not_open(&self.name)),
        }
    }

    fn size(&self) -> i64 {
        match self.record() {
            Some(record) => record.len() as i64,
            None => 0,
        }
    }

    fn set_size(&mut self, size: i64) -> bool {
        if size < 0 {
            return self.fail(VfsError::invalid_argument(&self.name, "negative size"));
        }
        let record = match self.record() {
            Some(record) => record,
            None => return self.fail(VfsError::not_found(&self.name)),
        };
        let Ok(target) = usize::try_from(size) else {
            return self.fail(VfsError::OutOfRange {
                path: self.name.clone(),
                position: size,
            });
        };
        let len = {
            let mut data = record.lock();
            if !grow(&mut data.content, target) {
                return self.fail(VfsError::OutOfRange {
                    path: self.name.clone(),
                    position: size,
                });
            }
            data.content.truncate(target);
            data.touch();
            data.content.len() as i64
        };
        if let Some(handle) = &mut self.handle {
            handle.clamp_to(len);
        }
        len == size
    }

    fn remove(&mut self) -> bool {
        let result = self.store.remove(&self.name);
        self.outcome(result)
    }

    fn copy(&mut self, new_name: &str) -> bool {
        let result = self.store.copy(&self.name, new_name);
        self.outcome(result)
    }

    fn rename(&mut self, new_name: &str) -> bool {
        let result = self.store.rename(&self.name, new_name);
        self.outcome(result)
    }

    fn link(&mut self, new_name: &str) -> bool {
        let result = self.store.hard_link(&self.name, new_name);
        self.outcome(result)
    }

    fn mkdir(&mut self, dir: &str, create_parents: bool) -> bool {
        let result = self.store.create_dir(dir, create_parents);
        self.outcome(result)
    }

    fn rmdir(&mut self, dir: &str, recurse_parents: bool) -> bool {
        if let Err(err) = self.store.remove_dir(dir) {
            return self.fail(err);
        }
        if recurse_parents {
            let mut parent = path::parent_path(&store_key(dir));
            while parent != "/" && self.store.remove_dir(&parent).is_ok() {
                parent = path::parent_path(&parent);
            }
        }
        true
    }

    fn file_flags(&self, mask: FileFlags) -> FileFlags {
        let mut flags = FileFlags::empty();
        let (kind, record) = match self.store.lookup(&self.name, false) {
            Some(entry) => entry,
            None => return flags,
        };

        let target = match kind {
            NodeKind::Symlink(_) => {
                flags |= FileFlags::LINK_TYPE;
                self.store.lookup(&self.name, true)
            }
            other => Some((other, record)),
        };
        if let Some((kind, record)) = target {
            flags |= FileFlags::EXISTS;
            flags |= match kind {
                NodeKind::Directory => FileFlags::DIRECTORY_TYPE,
                _ => FileFlags::FILE_TYPE,
            };
            flags |= record.lock().permissions;
        }

        let key = self.key();
        if key == "/" {
            flags |= FileFlags::ROOT;
        }
        if path::file_name(&key).starts_with('.') {
            flags |= FileFlags::HIDDEN;
        }
        flags & mask
    }

    fn set_permissions(&mut self, perms: FileFlags) -> bool {
        match self.record() {
            Some(record) => {
                let mut data = record.lock();
                data.permissions = perms.permissions();
                data.changed = SystemTime::now();
                true
            }
            None => self.fail(VfsError::not_found(&self.name)),
        }
    }

    fn file_name(&self, which: FileName) -> String {
        match which {
            FileName::Default => self.name.clone(),
            FileName::Base => path::file_name(&self.name).to_string(),
            FileName::Path => path::parent_path(&self.name),
            FileName::Absolute => self.key(),
            FileName::AbsolutePath => path::parent_path(&self.key()),
            FileName::Canonical => self.store.canonical_path(&self.name).unwrap_or_default(),
            FileName::CanonicalPath => self
                .store
                .canonical_path(&self.name)
                .map(|p| path::parent_path(&p))
                .unwrap_or_default(),
            FileName::LinkTarget => self.store.link_target(&self.name).unwrap_or_default(),
        }
    }

    fn set_file_name(&mut self, name: &str) {
        if self.handle.is_some() {
            tracing::warn!(target: crate::engine::TARGET, path = %self.name, "cannot rename an open engine");
            return;
        }
        self.name = name.to_string();
    }

    fn owner_id(&self, owner: FileOwner) -> Option<u32> {
        let record = self.record()?;
        let data = record.lock();
        Some(match owner {
            FileOwner::User => data.user_id,
            FileOwner::Group => data.group_id,
        })
    }

    fn owner(&self, owner: FileOwner) -> Option<String> {
        let id = self.owner_id(owner)?;
        match owner {
            FileOwner::User => self.store.user_name(id),
            FileOwner::Group => self.store.group_name(id),
        }
    }

    fn file_time(&self, time: FileTime) -> Option<SystemTime> {
        self.record().map(|record| record.lock().time(time))
    }

    fn set_file_time(&mut self, time: SystemTime, which: FileTime) -> bool {
        match self.record() {
            Some(record) => {
                record.lock().set_time(which, time);
                true
            }
            None => self.fail(VfsError::not_found(&self.name)),
        }
    }

    fn is_relative_path(&self) -> bool {
        false
    }

    fn id(&self) -> Option<String> {
        self.record().map(|record| format!("mem:{}", record.id()))
    }

    fn error(&self) -> Option<&VfsError> {
        self.error.as_ref()
    }

    fn as_dir_iterable(&self) -> Option<&dyn DirIterable> {
        Some(self)
    }
}

impl DirIterable for MemoryEngine {
    fn begin_entry_list(&self, _filters: DirFilters, _name_filters: &[String]) -> Option<EntryNames> {
        let names = self.store.children(&self.name)?;
        Some(Box::new(names.into_iter()))
    }
}

/// Handler that serves paths from a shared [`MemoryFileStore`].
///
/// Without a prefix it claims every path outside the resource namespace;
/// with one it claims the prefix and everything below it.
#[derive(Debug, Clone)]
pub struct MemoryHandler {
    store: Arc<MemoryFileStore>,
    prefix: Option<String>,
}

impl MemoryHandler {
    pub fn new(store: Arc<MemoryFileStore>) -> Self {
        Self { store, prefix: None }
    }

    /// Claim only `prefix` and paths below it
    pub fn with_prefix(store: Arc<MemoryFileStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: Some(store_key(prefix)),
        }
    }

    pub fn store(&self) -> &Arc<MemoryFileStore> {
        &self.store
    }

    fn claims(&self, path: &str) -> bool {
        if path::is_resource_path(path) {
            return false;
        }
        match &self.prefix {
            None => true,
            Some(prefix) if prefix == "/" => true,
            Some(prefix) => {
                let key = store_key(path);
                key == *prefix || key.starts_with(&format!("{prefix}/"))
            }
        }
    }
}

impl EngineHandler for MemoryHandler {
    fn create(&self, path: &str) -> Option<Box<dyn FileEngine>> {
        if !self.claims(path) {
            return None;
        }
        Some(Box::new(MemoryEngine::new(Arc::clone(&self.store), path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(store: &Arc<MemoryFileStore>, path: &str) -> MemoryEngine {
        MemoryEngine::new(Arc::clone(store), path)
    }

    #[test]
    fn test_open_twice_fails() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/f");
        assert!(e.open(OpenMode::WRITE));
        assert!(!e.open(OpenMode::WRITE));
        assert!(matches!(e.error(), Some(VfsError::AlreadyOpen { .. })));
        assert_eq!(e.pos(), 0);
        assert!(e.close());
        assert!(!e.close());
    }

    #[test]
    fn test_read_only_open_of_missing_file_fails() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/missing");
        assert!(!e.open(OpenMode::READ));
        assert_eq!(e.pos(), -1);
        assert!(!store.exists("/missing"));
    }

    #[test]
    fn test_write_only_truncates_read_write_preserves() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"hello").unwrap();

        let mut e = engine(&store, "/f");
        assert!(e.open(OpenMode::READ_WRITE));
        assert_eq!(e.size(), 5);
        e.close();

        assert!(e.open(OpenMode::WRITE));
        assert_eq!(e.size(), 0);
        e.close();
    }

    #[test]
    fn test_append_positions_at_end() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"abc").unwrap();
        let mut e = engine(&store, "/f");
        assert!(e.open(OpenMode::APPEND));
        assert_eq!(e.pos(), 3);
        assert_eq!(e.write(b"de"), 2);
        e.close();
        assert_eq!(store.read_file("/f").unwrap(), b"abcde");
    }

    #[test]
    fn test_new_only_and_existing_only() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/f");
        assert!(!e.open(OpenMode::WRITE | OpenMode::EXISTING_ONLY));
        assert!(e.open(OpenMode::WRITE | OpenMode::NEW_ONLY));
        e.close();
        assert!(!e.open(OpenMode::WRITE | OpenMode::NEW_ONLY));
        assert!(matches!(e.error(), Some(VfsError::AlreadyExists { .. })));
    }

    #[test]
    fn test_read_requires_read_mode() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/f");
        let mut buf = [0u8; 4];
        assert_eq!(e.read(&mut buf), -1);
        assert!(matches!(e.error(), Some(VfsError::NotOpen { .. })));

        assert!(e.open(OpenMode::WRITE));
        assert_eq!(e.read(&mut buf), -1);
        assert_eq!(e.pos(), 0);
    }

    #[test]
    fn test_read_past_end_is_failure() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/five", b"12345").unwrap();
        let mut e = engine(&store, "/five");
        assert!(e.open(OpenMode::READ));
        assert!(e.seek(10));
        let mut buf = [0u8; 4];
        assert_eq!(e.read(&mut buf), -1);
        assert_eq!(e.pos(), 10);
        assert!(matches!(e.error(), Some(VfsError::OutOfRange { position: 10, .. })));

        assert!(e.seek(5));
        assert_eq!(e.read(&mut buf), 0);
        assert!(e.seek(3));
        assert_eq!(e.read(&mut buf), 2);
        assert_eq!(&buf[..2], b"45");
    }

    #[test]
    fn test_write_past_end_grows() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/gap");
        assert!(e.open(OpenMode::READ_WRITE));
        assert_eq!(e.write(b"AB"), 2);
        assert!(e.seek(10));
        assert_eq!(e.size(), 2);
        assert_eq!(e.write(b"CD"), 2);
        assert_eq!(e.size(), 12);
        assert_eq!(e.pos(), 12);
    }

    #[test]
    fn test_overwrite_in_place() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"hello world").unwrap();
        let mut e = engine(&store, "/f");
        assert!(e.open(OpenMode::READ_WRITE));
        e.seek(6);
        e.write(b"WORLD");
        e.close();
        assert_eq!(store.read_file("/f").unwrap(), b"hello WORLD");
    }

    #[test]
    fn test_seek_rules() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/f");
        assert!(!e.seek(0));
        assert!(e.open(OpenMode::WRITE));
        assert!(!e.seek(-1));
        assert!(matches!(e.error(), Some(VfsError::InvalidArgument { .. })));
        assert!(e.seek(100));
        assert_eq!(e.size(), 0);
    }

    #[test]
    fn test_write_at_huge_offset_fails() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"abc").unwrap();
        let mut e = engine(&store, "/f");
        assert!(e.open(OpenMode::READ_WRITE));
        assert!(e.seek(i64::MAX));
        assert_eq!(e.write(b"x"), -1);
        assert!(matches!(e.error(), Some(VfsError::OutOfRange { position: i64::MAX, .. })));
        assert_eq!(e.pos(), i64::MAX);
        assert!(e.seek(3));
        assert_eq!(e.write(b"d"), 1);
        e.close();
        assert_eq!(store.read_file("/f").unwrap(), b"abcd");
    }

    #[test]
    fn test_set_size_huge_fails() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"abc").unwrap();
        let mut e = engine(&store, "/f");
        assert!(!e.set_size(i64::MAX));
        assert!(matches!(e.error(), Some(VfsError::OutOfRange { .. })));
        assert_eq!(e.size(), 3);
        assert_eq!(store.read_file("/f").unwrap(), b"abc");
    }

    #[test]
    fn test_size_without_open_and_missing() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"abc").unwrap();
        assert_eq!(engine(&store, "/f").size(), 3);
        assert_eq!(engine(&store, "/nothing").size(), 0);
    }

    #[test]
    fn test_set_size_clamps_cursor() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"0123456789").unwrap();
        let mut e = engine(&store, "/f");
        assert!(e.open(OpenMode::READ_WRITE));
        e.seek(8);
        assert!(e.set_size(4));
        assert_eq!(e.pos(), 4);
        assert!(e.set_size(6));
        assert_eq!(e.size(), 6);
        assert!(!e.set_size(-1));
        assert!(!engine(&store, "/missing").set_size(1));
    }

    #[test]
    fn test_file_flags() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/dir/.hidden", b"").unwrap();
        store.symlink("/dir", "/link").unwrap();

        let file = engine(&store, "/dir/.hidden").file_flags(FileFlags::everything());
        assert!(file.contains(FileFlags::FILE_TYPE | FileFlags::EXISTS | FileFlags::HIDDEN));
        assert!(file.contains(FileFlags::READ_OWNER));

        let dir = engine(&store, "/dir").file_flags(FileFlags::TYPES_MASK);
        assert_eq!(dir, FileFlags::DIRECTORY_TYPE);

        let link = engine(&store, "/link").file_flags(FileFlags::TYPES_MASK);
        assert_eq!(link, FileFlags::LINK_TYPE | FileFlags::DIRECTORY_TYPE);

        assert!(engine(&store, "/").file_flags(FileFlags::ROOT).contains(FileFlags::ROOT));
        assert!(engine(&store, "/none").file_flags(FileFlags::everything()).is_empty());
    }

    #[test]
    fn test_rename_keeps_engine_name() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/a", b"1").unwrap();
        let mut e = engine(&store, "/a");
        assert!(e.rename("/b"));
        assert_eq!(e.file_name(FileName::Default), "/a");
        assert!(!e.rename("/c"));
        assert!(matches!(e.error(), Some(VfsError::NotFound { .. })));
    }

    #[test]
    fn test_set_file_name_refused_while_open() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/a");
        assert!(e.open(OpenMode::WRITE));
        e.set_file_name("/b");
        assert_eq!(e.file_name(FileName::Default), "/a");
        e.close();
        e.set_file_name("/b");
        assert_eq!(e.file_name(FileName::Default), "/b");
    }

    #[test]
    fn test_names() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/real/f.txt", b"").unwrap();
        store.symlink("/real/f.txt", "/ln").unwrap();
        let e = engine(&store, "/ln");
        assert_eq!(e.file_name(FileName::Base), "ln");
        assert_eq!(e.file_name(FileName::Path), "/");
        assert_eq!(e.file_name(FileName::Canonical), "/real/f.txt");
        assert_eq!(e.file_name(FileName::CanonicalPath), "/real");
        assert_eq!(e.file_name(FileName::LinkTarget), "/real/f.txt");
        assert_eq!(engine(&store, "/gone").file_name(FileName::Canonical), "");
    }

    #[test]
    fn test_link_shares_identity() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/a", b"x").unwrap();
        let mut e = engine(&store, "/a");
        assert!(e.link("/b"));
        assert_eq!(e.id(), engine(&store, "/b").id());
        assert_ne!(e.id(), None);
    }

    #[test]
    fn test_mkdir_rmdir() {
        let store = Arc::new(MemoryFileStore::new());
        let mut e = engine(&store, "/");
        assert!(e.mkdir("/a/b/c", true));
        assert!(!e.mkdir("/x/y", false));
        assert!(e.rmdir("/a/b/c", true));
        assert!(!store.exists("/a"));
    }

    #[test]
    fn test_times_and_owners() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/f", b"").unwrap();
        let mut e = engine(&store, "/f");
        let stamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000);
        assert!(e.set_file_time(stamp, FileTime::Modification));
        assert_eq!(e.file_time(FileTime::Modification), Some(stamp));
        assert_eq!(e.owner_id(FileOwner::User), Some(0));
        assert_eq!(e.owner(FileOwner::User), None);
        assert!(e.set_permissions(FileFlags::READ_OWNER));
        assert_eq!(e.file_flags(FileFlags::PERMS_MASK), FileFlags::READ_OWNER);
    }

    #[test]
    fn test_directory_listing() {
        let store = Arc::new(MemoryFileStore::new());
        store.write_file("/d/a", b"").unwrap();
        store.write_file("/d/b", b"").unwrap();
        let e = engine(&store, "/d");
        let names: Vec<String> = e
            .as_dir_iterable()
            .and_then(|it| it.begin_entry_list(DirFilters::default(), &[]))
            .unwrap()
            .collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

        let file = engine(&store, "/d/a");
        assert!(file
            .as_dir_iterable()
            .and_then(|it| it.begin_entry_list(DirFilters::default(), &[]))
            .is_none());
    }

    #[test]
    fn test_handler_prefix() {
        let store = Arc::new(MemoryFileStore::new());
        let handler = MemoryHandler::with_prefix(Arc::clone(&store), "/mem");
        assert!(handler.create("/mem").is_some());
        assert!(handler.create("/mem/a").is_some());
        assert!(handler.create("/memory").is_none());
        assert!(handler.create(":/res").is_none());
        assert!(MemoryHandler::new(store).create("/anything").is_some());
    }
}
