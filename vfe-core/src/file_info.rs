//! Directory entry records with lazily loaded metadata

use crate::engine::FileEngine;
use crate::flags::{FileFlags, FileName, FileOwner, FileTime};
use crate::path;
use crate::resolver::EngineResolver;
use once_cell::unsync::OnceCell;
use std::time::SystemTime;

/// Snapshot of an entry's metadata
#[derive(Debug, Clone)]
struct Metadata {
    flags: FileFlags,
    size: i64,
    absolute: String,
    canonical: String,
    link_target: String,
    modified: Option<SystemTime>,
    accessed: Option<SystemTime>,
    birth: Option<SystemTime>,
    changed: Option<SystemTime>,
    user_id: Option<u32>,
    group_id: Option<u32>,
    user: Option<String>,
    group: Option<String>,
}

impl Metadata {
    fn load(engine: &dyn FileEngine) -> Self {
        let flags = engine.file_flags(FileFlags::everything());
        let exists = flags.contains(FileFlags::EXISTS);
        Self {
            flags,
            size: if exists { engine.size() } else { 0 },
            absolute: engine.file_name(FileName::Absolute),
            canonical: if exists {
                engine.file_name(FileName::Canonical)
            } else {
                String::new()
            },
            link_target: if flags.contains(FileFlags::LINK_TYPE) {
                engine.file_name(FileName::LinkTarget)
            } else {
                String::new()
            },
            modified: engine.file_time(FileTime::Modification),
            accessed: engine.file_time(FileTime::Access),
            birth: engine.file_time(FileTime::Birth),
            changed: engine.file_time(FileTime::MetadataChange),
            user_id: engine.owner_id(FileOwner::User),
            group_id: engine.owner_id(FileOwner::Group),
            user: engine.owner(FileOwner::User),
            group: engine.owner(FileOwner::Group),
        }
    }
}

/// One entry: its path plus metadata fetched on first use.
///
/// Name accessors work on the path alone; everything else binds an
/// engine and snapshots its answers once. Call [`refresh`](Self::refresh)
/// to drop the snapshot.
#[derive(Debug, Clone)]
pub struct FileInfo {
    path: String,
    resolver: EngineResolver,
    meta: OnceCell<Metadata>,
}

impl FileInfo {
    /// Entry resolved through the process-wide resolver
    pub fn new(path: &str) -> Self {
        Self::with_resolver(EngineResolver::global(), path)
    }

    pub fn with_resolver(resolver: EngineResolver, path: &str) -> Self {
        Self {
            path: path.to_string(),
            resolver,
            meta: OnceCell::new(),
        }
    }

    /// Entry `name` inside `dir`
    pub fn in_dir(resolver: EngineResolver, dir: &str, name: &str) -> Self {
        Self::with_resolver(resolver, &path::join(dir, name))
    }

    fn meta(&self) -> &Metadata {
        self.meta.get_or_init(|| {
            let engine = self.resolver.create(&self.path);
            Metadata::load(engine.as_ref())
        })
    }

    /// Whether metadata has been loaded yet
    pub fn is_cached(&self) -> bool {
        self.meta.get().is_some()
    }

    pub fn refresh(&mut self) {
        self.meta = OnceCell::new();
    }

    /// Last segment of the path
    pub fn file_name(&self) -> &str {
        path::file_name(&self.path)
    }

    /// The path as given
    pub fn file_path(&self) -> &str {
        &self.path
    }

    /// Directory part of the path
    pub fn path(&self) -> String {
        path::parent_path(&self.path)
    }

    pub fn absolute_file_path(&self) -> &str {
        &self.meta().absolute
    }

    pub fn absolute_path(&self) -> String {
        path::parent_path(&self.meta().absolute)
    }

    /// Absolute path with links resolved; empty when the entry is missing
    pub fn canonical_file_path(&self) -> &str {
        &self.meta().canonical
    }

    pub fn canonical_path(&self) -> String {
        let canonical = &self.meta().canonical;
        if canonical.is_empty() {
            String::new()
        } else {
            path::parent_path(canonical)
        }
    }

    pub fn base_name(&self) -> &str {
        path::base_name(&self.path)
    }

    pub fn suffix(&self) -> &str {
        path::suffix(&self.path)
    }

    pub fn complete_suffix(&self) -> &str {
        path::complete_suffix(&self.path)
    }

    pub fn is_relative(&self) -> bool {
        path::is_relative_path(&self.path)
    }

    pub fn exists(&self) -> bool {
        self.meta().flags.contains(FileFlags::EXISTS)
    }

    pub fn is_file(&self) -> bool {
        self.meta().flags.contains(FileFlags::FILE_TYPE)
    }

    pub fn is_dir(&self) -> bool {
        self.meta().flags.contains(FileFlags::DIRECTORY_TYPE)
    }

    pub fn is_symlink(&self) -> bool {
        self.meta().flags.contains(FileFlags::LINK_TYPE)
    }

    pub fn is_hidden(&self) -> bool {
        self.meta().flags.contains(FileFlags::HIDDEN)
    }

    pub fn is_root(&self) -> bool {
        self.meta().flags.contains(FileFlags::ROOT)
    }

    pub fn is_readable(&self) -> bool {
        self.meta().flags.contains(FileFlags::READ_USER)
    }

    pub fn is_writable(&self) -> bool {
        self.meta().flags.contains(FileFlags::WRITE_USER)
    }

    pub fn is_executable(&self) -> bool {
        self.meta().flags.contains(FileFlags::EXE_USER)
    }

    pub fn permissions(&self) -> FileFlags {
        self.meta().flags.permissions()
    }

    pub fn permission(&self, perms: FileFlags) -> bool {
        self.permissions().contains(perms.permissions())
    }

    /// All flags the engine reported
    pub fn flags(&self) -> FileFlags {
        self.meta().flags
    }

    /// Size in bytes; `0` for missing entries
    pub fn size(&self) -> i64 {
        self.meta().size
    }

    /// Absolute target of a symbolic link; empty otherwise
    pub fn symlink_target(&self) -> &str {
        &self.meta().link_target
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.meta().modified
    }

    pub fn last_read(&self) -> Option<SystemTime> {
        self.meta().accessed
    }

    pub fn birth_time(&self) -> Option<SystemTime> {
        self.meta().birth
    }

    pub fn metadata_change_time(&self) -> Option<SystemTime> {
        self.meta().changed
    }

    pub fn file_time(&self, which: FileTime) -> Option<SystemTime> {
        match which {
            FileTime::Access => self.last_read(),
            FileTime::Birth => self.birth_time(),
            FileTime::MetadataChange => self.metadata_change_time(),
            FileTime::Modification => self.last_modified(),
        }
    }

    pub fn owner_id(&self) -> Option<u32> {
        self.meta().user_id
    }

    pub fn group_id(&self) -> Option<u32> {
        self.meta().group_id
    }

    pub fn owner(&self) -> Option<&str> {
        self.meta().user.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.meta().group.as_deref()
    }

    pub fn resolver(&self) -> &EngineResolver {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHandler;
    use crate::registry::HandlerGuard;
    use crate::store::MemoryFileStore;
    use std::sync::Arc;

    fn setup() -> (EngineResolver, Arc<MemoryFileStore>, HandlerGuard) {
        let resolver = EngineResolver::isolated();
        let store = Arc::new(MemoryFileStore::new());
        let guard = resolver.registry().register(MemoryHandler::new(Arc::clone(&store)));
        (resolver, store, guard)
    }

    #[test]
    fn test_names_need_no_metadata() {
        let (resolver, _store, _guard) = setup();
        let info = FileInfo::with_resolver(resolver, "/dir/archive.tar.gz");
        assert_eq!(info.file_name(), "archive.tar.gz");
        assert_eq!(info.path(), "/dir");
        assert_eq!(info.base_name(), "archive");
        assert_eq!(info.suffix(), "gz");
        assert_eq!(info.complete_suffix(), "tar.gz");
        assert!(!info.is_cached());
    }

    #[test]
    fn test_metadata_is_lazy_and_cached() {
        let (resolver, store, _guard) = setup();
        store.write_file("/f.txt", b"12345").unwrap();
        let mut info = FileInfo::with_resolver(resolver, "/f.txt");
        assert_eq!(info.size(), 5);
        assert!(info.is_cached());

        store.write_file("/f.txt", b"1").unwrap();
        assert_eq!(info.size(), 5);
        info.refresh();
        assert_eq!(info.size(), 1);
    }

    #[test]
    fn test_types_and_links() {
        let (resolver, store, _guard) = setup();
        store.write_file("/d/f", b"").unwrap();
        store.symlink("/d", "/ln").unwrap();
        store.symlink("/gone", "/dangling").unwrap();

        let dir = FileInfo::with_resolver(resolver.clone(), "/d");
        assert!(dir.is_dir() && !dir.is_file() && dir.exists());

        let link = FileInfo::with_resolver(resolver.clone(), "/ln");
        assert!(link.is_symlink() && link.is_dir());
        assert_eq!(link.canonical_file_path(), "/d");
        assert_eq!(link.symlink_target(), "/d");

        let dangling = FileInfo::with_resolver(resolver.clone(), "/dangling");
        assert!(dangling.is_symlink());
        assert!(!dangling.exists());
        assert_eq!(dangling.canonical_file_path(), "");

        let missing = FileInfo::with_resolver(resolver, "/none");
        assert!(!missing.exists());
        assert_eq!(missing.size(), 0);
    }

    #[test]
    fn test_permissions() {
        let (resolver, store, _guard) = setup();
        store.write_file("/f", b"").unwrap();
        let info = FileInfo::with_resolver(resolver, "/f");
        assert!(info.is_readable());
        assert!(info.is_writable());
        assert!(!info.is_executable());
        assert!(info.permission(FileFlags::READ_OWNER | FileFlags::READ_OTHER));
        assert!(!info.permission(FileFlags::WRITE_OTHER));
        assert!(info.last_modified().is_some());
        assert_eq!(info.owner_id(), Some(0));
    }

    #[test]
    fn test_in_dir() {
        let (resolver, store, _guard) = setup();
        store.write_file("/d/.hidden", b"").unwrap();
        let info = FileInfo::in_dir(resolver, "/d", ".hidden");
        assert_eq!(info.file_path(), "/d/.hidden");
        assert!(info.is_hidden());
        assert_eq!(info.absolute_file_path(), "/d/.hidden");
    }
}
