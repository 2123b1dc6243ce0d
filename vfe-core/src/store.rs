//! Shared in-memory file table
//!
//! A coarse lock guards the path → record map and the record arena; every
//! record carries its own lock for content and metadata. Lookups take the
//! coarse lock, clone the record handle out and release it, so I/O on
//! different files never contends.

use crate::error::{VfsError, VfsResult};
use crate::flags::{FileFlags, FileTime};
use crate::path::{self, CleanFlags};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use vfe_config::MemoryStoreConfig;

/// Symbolic links followed before a lookup gives up
const MAX_SYMLINK_HOPS: usize = 40;

const TARGET: &str = "vfe::engine";

/// Arena index of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a path names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    /// Link target as written when the link was created
    Symlink(String),
}

impl NodeKind {
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, NodeKind::Symlink(_))
    }
}

/// Content and metadata of one record
#[derive(Debug, Clone)]
pub struct FileData {
    pub content: Vec<u8>,
    /// Permission bits only
    pub permissions: FileFlags,
    pub user_id: u32,
    pub group_id: u32,
    pub birth: SystemTime,
    pub modified: SystemTime,
    pub accessed: SystemTime,
    pub changed: SystemTime,
}

impl FileData {
    fn new(kind: &NodeKind, defaults: &MemoryStoreConfig) -> Self {
        let now = SystemTime::now();
        let base = FileFlags::from_bits_truncate(defaults.default_permissions).permissions();
        let permissions = match kind {
            NodeKind::File => base,
            NodeKind::Directory => {
                base | FileFlags::EXE_OWNER
                    | FileFlags::EXE_USER
                    | FileFlags::EXE_GROUP
                    | FileFlags::EXE_OTHER
            }
            NodeKind::Symlink(_) => FileFlags::PERMS_MASK,
        };
        Self {
            content: Vec::new(),
            permissions,
            user_id: defaults.default_user_id,
            group_id: defaults.default_group_id,
            birth: now,
            modified: now,
            accessed: now,
            changed: now,
        }
    }

    pub fn time(&self, which: FileTime) -> SystemTime {
        match which {
            FileTime::Access => self.accessed,
            FileTime::Birth => self.birth,
            FileTime::MetadataChange => self.changed,
            FileTime::Modification => self.modified,
        }
    }

    pub fn set_time(&mut self, which: FileTime, time: SystemTime) {
        match which {
            FileTime::Access => self.accessed = time,
            FileTime::Birth => self.birth = time,
            FileTime::MetadataChange => self.changed = time,
            FileTime::Modification => self.modified = time,
        }
    }

    /// Content changed just now
    pub fn touch(&mut self) {
        let now = SystemTime::now();
        self.modified = now;
        self.changed = now;
    }
}

/// A record shared by every engine opened on its path(s)
#[derive(Debug)]
pub struct FileRecord {
    id: RecordId,
    data: Mutex<FileData>,
}

impl FileRecord {
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Lock content and metadata; a poisoned lock is taken over as is
    pub fn lock(&self) -> MutexGuard<'_, FileData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Slot {
    record: Arc<FileRecord>,
    kind: NodeKind,
    /// Number of paths naming this record
    links: usize,
}

#[derive(Debug)]
struct StoreInner {
    paths: BTreeMap<String, RecordId>,
    slots: HashMap<RecordId, Slot>,
    next_id: u64,
}

impl StoreInner {
    fn node(&self, key: &str) -> Option<&Slot> {
        self.paths.get(key).and_then(|id| self.slots.get(id))
    }

    fn insert(&mut self, key: String, kind: NodeKind, defaults: &MemoryStoreConfig) -> Arc<FileRecord> {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        let record = Arc::new(FileRecord {
            id,
            data: Mutex::new(FileData::new(&kind, defaults)),
        });
        self.slots.insert(
            id,
            Slot {
                record: Arc::clone(&record),
                kind,
                links: 1,
            },
        );
        self.paths.insert(key, id);
        record
    }

    /// Resolve symbolic links along `key`. Missing trailing parts are kept,
    /// so the result also names where a new entry would go.
    fn resolve(&self, key: &str, follow_last: bool) -> VfsResult<String> {
        let mut pending: VecDeque<String> = segments(key).collect();
        let mut current = String::from("/");
        let mut hops = 0;

        while let Some(segment) = pending.pop_front() {
            if segment == ".." {
                current = path::parent_path(&current);
                continue;
            }
            let candidate = path::join(&current, &segment);
            let follow = !pending.is_empty() || follow_last;
            if let Some(NodeKind::Symlink(target)) = self.node(&candidate).map(|s| s.kind.clone()) {
                if follow {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(VfsError::InvalidPath {
                            path: key.to_string(),
                            reason: String::from("too many levels of symbolic links"),
                        });
                    }
                    let absolute = path::join(&current, &target);
                    let mut next: VecDeque<String> = segments(&clean(&absolute)).collect();
                    next.extend(pending.drain(..));
                    pending = next;
                    current = String::from("/");
                    continue;
                }
            }
            current = candidate;
        }
        Ok(current)
    }

    /// Create the missing directories of `dir`
    fn ensure_dirs(&mut self, dir: &str, defaults: &MemoryStoreConfig) -> VfsResult<()> {
        let mut current = String::new();
        for segment in segments(dir) {
            current.push('/');
            current.push_str(&segment);
            match self.node(&current).map(|s| s.kind.is_dir()) {
                Some(true) => {}
                Some(false) => {
                    return Err(VfsError::InvalidPath {
                        path: current,
                        reason: String::from("not a directory"),
                    })
                }
                None => {
                    self.insert(current.clone(), NodeKind::Directory, defaults);
                }
            }
        }
        Ok(())
    }

    fn unlink(&mut self, key: &str) {
        if let Some(id) = self.paths.remove(key) {
            let gone = match self.slots.get_mut(&id) {
                Some(slot) => {
                    slot.links -= 1;
                    slot.links == 0
                }
                None => false,
            };
            if gone {
                self.slots.remove(&id);
            }
        }
    }

    fn descendants(&self, key: &str) -> Vec<(String, RecordId)> {
        let prefix = child_prefix(key);
        self.paths
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, id)| (k.clone(), *id))
            .collect()
    }

    fn children(&self, key: &str) -> Vec<String> {
        let prefix = child_prefix(key);
        self.paths
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| {
                let rest = &k[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }
}

fn child_prefix(key: &str) -> String {
    if key.ends_with('/') {
        key.to_string()
    } else {
        format!("{key}/")
    }
}

fn segments(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(String::from)
}

fn clean(path: &str) -> String {
    path::clean_path_with(path, CleanFlags::empty())
}

/// Store key for `path`: cleaned and anchored at `/`
pub fn store_key(path: &str) -> String {
    let cleaned = clean(path);
    if cleaned.starts_with('/') {
        cleaned
    } else if cleaned == "." || cleaned.is_empty() {
        String::from("/")
    } else {
        clean(&format!("/{cleaned}"))
    }
}

/// A toy file system held in memory.
///
/// `/` always exists. Writing below a missing directory creates it.
///
/// # Example
/// ```
/// use vfe_core::MemoryFileStore;
///
/// let store = MemoryFileStore::new();
/// store.write_file("/docs/a.txt", b"hello").unwrap();
/// assert_eq!(store.read_file("/docs/a.txt").unwrap(), b"hello");
/// assert_eq!(store.children("/docs").unwrap(), vec!["a.txt".to_string()]);
/// ```
#[derive(Debug)]
pub struct MemoryFileStore {
    inner: Mutex<StoreInner>,
    defaults: MemoryStoreConfig,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Empty store whose new records take owners and permissions from `defaults`
    pub fn with_config(defaults: MemoryStoreConfig) -> Self {
        let mut inner = StoreInner {
            paths: BTreeMap::new(),
            slots: HashMap::new(),
            next_id: 1,
        };
        inner.insert(String::from("/"), NodeKind::Directory, &defaults);
        Self {
            inner: Mutex::new(inner),
            defaults,
        }
    }

    /// Store pre-populated with files.
    pub fn with_files<I, S>(files: I) -> VfsResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let store = Self::new();
        for (path, content) in files {
            store.write_file(path.as_ref(), &content)?;
        }
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Kind and record of `path`
    pub fn lookup(&self, path: &str, follow: bool) -> Option<(NodeKind, Arc<FileRecord>)> {
        let inner = self.lock();
        let key = inner.resolve(&store_key(path), follow).ok()?;
        inner
            .node(&key)
            .map(|slot| (slot.kind.clone(), Arc::clone(&slot.record)))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lookup(path, true).is_some()
    }

    /// Record behind the file at `path`, created when missing and `create`
    /// is set. Check and insert happen under one lock.
    pub fn open_record(&self, path: &str, create: bool, exclusive: bool) -> VfsResult<Arc<FileRecord>> {
        let mut inner = self.lock();
        let key = inner.resolve(&store_key(path), true)?;
        match inner.node(&key) {
            Some(_) if exclusive => Err(VfsError::already_exists(path)),
            Some(slot) if slot.kind.is_dir() => {
                Err(VfsError::invalid_argument(path, "is a directory"))
            }
            Some(slot) => Ok(Arc::clone(&slot.record)),
            None if !create => Err(VfsError::not_found(path)),
            None => {
                inner.ensure_dirs(&path::parent_path(&key), &self.defaults)?;
                tracing::trace!(target: TARGET, path = %key, "memory record created");
                Ok(inner.insert(key, NodeKind::File, &self.defaults))
            }
        }
    }

    pub fn create_dir(&self, path: &str, create_parents: bool) -> VfsResult<()> {
        let mut inner = self.lock();
        let key = inner.resolve(&store_key(path), true)?;
        if inner.node(&key).is_some() {
            return Err(VfsError::already_exists(path));
        }
        let parent = path::parent_path(&key);
        if create_parents {
            inner.ensure_dirs(&parent, &self.defaults)?;
        } else if !inner.node(&parent).is_some_and(|s| s.kind.is_dir()) {
            return Err(VfsError::not_found(&parent));
        }
        inner.insert(key, NodeKind::Directory, &self.defaults);
        Ok(())
    }

    /// Remove an empty directory
    pub fn remove_dir(&self, path: &str) -> VfsResult<()> {
        let mut inner = self.lock();
        let key = inner.resolve(&store_key(path), false)?;
        match inner.node(&key) {
            None => return Err(VfsError::not_found(path)),
            Some(slot) if !slot.kind.is_dir() => {
                return Err(VfsError::invalid_argument(path, "not a directory"))
            }
            Some(_) => {}
        }
        if key == "/" {
            return Err(VfsError::invalid_argument(path, "cannot remove the root"));
        }
        if !inner.children(&key).is_empty() {
            return Err(VfsError::invalid_argument(path, "directory not empty"));
        }
        inner.unlink(&key);
        Ok(())
    }

    /// Remove a file or link (never a directory)
    pub fn remove(&self, path: &str) -> VfsResult<()> {
        let mut inner = self.lock();
        let key = inner.resolve(&store_key(path), false)?;
        match inner.node(&key) {
            None => Err(VfsError::not_found(path)),
            Some(slot) if slot.kind.is_dir() => {
                Err(VfsError::invalid_argument(path, "is a directory"))
            }
            Some(_) => {
                inner.unlink(&key);
                Ok(())
            }
        }
    }

    /// Create a symbolic link at `link` pointing to `target`
    pub fn symlink(&self, target: &str, link: &str) -> VfsResult<()> {
        let mut inner = self.lock();
        let key = inner.resolve(&store_key(link), false)?;
        if inner.node(&key).is_some() {
            return Err(VfsError::already_exists(link));
        }
        inner.ensure_dirs(&path::parent_path(&key), &self.defaults)?;
        inner.insert(key, NodeKind::Symlink(target.to_string()), &self.defaults);
        Ok(())
    }

    /// Give the file at `existing` a second name
    pub fn hard_link(&self, existing: &str, new_path: &str) -> VfsResult<()> {
        let mut inner = self.lock();
        let source = inner.resolve(&store_key(existing), true)?;
        let id = match inner.paths.get(&source) {
            None => return Err(VfsError::not_found(existing)),
            Some(id) => *id,
        };
        if inner.slots.get(&id).is_some_and(|s| s.kind.is_dir()) {
            return Err(VfsError::invalid_argument(existing, "is a directory"));
        }
        let dest = inner.resolve(&store_key(new_path), false)?;
        if inner.paths.contains_key(&dest) {
            return Err(VfsError::already_exists(new_path));
        }
        inner.ensure_dirs(&path::parent_path(&dest), &self.defaults)?;
        inner.paths.insert(dest, id);
        if let Some(slot) = inner.slots.get_mut(&id) {
            slot.links += 1;
            slot.record.lock().changed = SystemTime::now();
        }
        Ok(())
    }

    /// Move `from` (and everything below it) to `to`.
    ///
    /// Fails without touching anything when `to` exists. Lookup and move
    /// happen under one lock, so of two racing renames onto the same
    /// destination exactly one wins.
    pub fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let mut inner = self.lock();
        let source = inner.resolve(&store_key(from), false)?;
        let id = match inner.paths.get(&source) {
            None => return Err(VfsError::not_found(from)),
            Some(id) => *id,
        };
        if source == "/" {
            return Err(VfsError::invalid_argument(from, "cannot rename the root"));
        }
        let dest = inner.resolve(&store_key(to), false)?;
        if inner.paths.contains_key(&dest) {
            return Err(VfsError::already_exists(to));
        }
        if dest.starts_with(&child_prefix(&source)) {
            return Err(VfsError::invalid_argument(to, "cannot move a directory into itself"));
        }
        inner.ensure_dirs(&path::parent_path(&dest), &self.defaults)?;

        let moved = inner.descendants(&source);
        inner.paths.remove(&source);
        inner.paths.insert(dest.clone(), id);
        for (old, child) in moved {
            inner.paths.remove(&old);
            inner.paths.insert(format!("{}{}", dest, &old[source.len()..]), child);
        }
        tracing::trace!(target: TARGET, from = %source, to = %dest, "memory record renamed");
        Ok(())
    }

    /// Duplicate the file at `from` into a new, independent record at `to`
    pub fn copy(&self, from: &str, to: &str) -> VfsResult<()> {
        let mut inner = self.lock();
        let source = inner.resolve(&store_key(from), true)?;
        let record = match inner.node(&source) {
            None => return Err(VfsError::not_found(from)),
            Some(slot) if !slot.kind.is_file() => {
                return Err(VfsError::invalid_argument(from, "not a file"))
            }
            Some(slot) => Arc::clone(&slot.record),
        };
        let dest = inner.resolve(&store_key(to), false)?;
        if inner.paths.contains_key(&dest) {
            return Err(VfsError::already_exists(to));
        }
        inner.ensure_dirs(&path::parent_path(&dest), &self.defaults)?;
        let copy = inner.insert(dest, NodeKind::File, &self.defaults);

        let data = record.lock().clone();
        let mut target = copy.lock();
        target.content = data.content;
        target.permissions = data.permissions;
        target.user_id = data.user_id;
        target.group_id = data.group_id;
        Ok(())
    }

    /// Names of the direct children of the directory at `path`
    pub fn children(&self, path: &str) -> Option<Vec<String>> {
        let inner = self.lock();
        let key = inner.resolve(&store_key(path), true).ok()?;
        match inner.node(&key) {
            Some(slot) if slot.kind.is_dir() => Some(inner.children(&key)),
            _ => None,
        }
    }

    /// `path` with every symbolic link resolved; `None` if it does not exist
    pub fn canonical_path(&self, path: &str) -> Option<String> {
        let inner = self.lock();
        let key = inner.resolve(&store_key(path), true).ok()?;
        inner.node(&key).map(|_| key)
    }

    /// Absolute target of the symbolic link at `path`
    pub fn link_target(&self, path: &str) -> Option<String> {
        let inner = self.lock();
        let key = inner.resolve(&store_key(path), false).ok()?;
        match inner.node(&key).map(|s| &s.kind) {
            Some(NodeKind::Symlink(target)) => {
                Some(clean(&path::join(&path::parent_path(&key), target)))
            }
            _ => None,
        }
    }

    pub fn user_name(&self, id: u32) -> Option<String> {
        self.defaults.users.get(&id).cloned()
    }

    pub fn group_name(&self, id: u32) -> Option<String> {
        self.defaults.groups.get(&id).cloned()
    }

    /// Create or replace the file at `path` with `content`
    pub fn write_file(&self, path: &str, content: &[u8]) -> VfsResult<()> {
        let record = self.open_record(path, true, false)?;
        let mut data = record.lock();
        data.content = content.to_vec();
        data.touch();
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        let record = self.open_record(path, false, false)?;
        let content = record.lock().content.clone();
        Ok(content)
    }
}

impl Default for MemoryFileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_root_always_exists() {
        let store = MemoryFileStore::new();
        let (kind, _) = store.lookup("/", true).unwrap();
        assert!(kind.is_dir());
        assert!(store.remove_dir("/").is_err());
        assert!(store.children("/").unwrap().is_empty());
    }

    #[test]
    fn test_store_key() {
        assert_eq!(store_key("a/b"), "/a/b");
        assert_eq!(store_key("/a//b/"), "/a/b");
        assert_eq!(store_key(""), "/");
        assert_eq!(store_key("."), "/");
    }

    #[test]
    fn test_write_creates_parents() {
        let store = MemoryFileStore::new();
        store.write_file("/a/b/c.txt", b"x").unwrap();
        assert!(store.lookup("/a", true).unwrap().0.is_dir());
        assert!(store.lookup("/a/b", true).unwrap().0.is_dir());
        assert_eq!(store.children("/a").unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_same_record_is_shared() {
        let store = MemoryFileStore::new();
        let first = store.open_record("/f", true, false).unwrap();
        let second = store.open_record("/f", true, false).unwrap();
        assert_eq!(first.id(), second.id());
        first.lock().content.extend_from_slice(b"abc");
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_exclusive_and_missing() {
        let store = MemoryFileStore::new();
        store.write_file("/f", b"").unwrap();
        assert_eq!(
            store.open_record("/f", true, true).unwrap_err(),
            VfsError::already_exists("/f")
        );
        assert_eq!(
            store.open_record("/nope", false, false).unwrap_err(),
            VfsError::not_found("/nope")
        );
    }

    #[test]
    fn test_directory_cannot_be_opened() {
        let store = MemoryFileStore::new();
        store.create_dir("/d", false).unwrap();
        assert!(matches!(
            store.open_record("/d", false, false),
            Err(VfsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_create_dir_requires_parent() {
        let store = MemoryFileStore::new();
        assert!(store.create_dir("/x/y", false).is_err());
        store.create_dir("/x/y", true).unwrap();
        assert!(store.create_dir("/x/y", true).is_err());
    }

    #[test]
    fn test_remove_dir_must_be_empty() {
        let store = MemoryFileStore::new();
        store.write_file("/d/f", b"1").unwrap();
        assert!(store.remove_dir("/d").is_err());
        store.remove("/d/f").unwrap();
        store.remove_dir("/d").unwrap();
        assert!(!store.exists("/d"));
    }

    #[test]
    fn test_remove_refuses_directories() {
        let store = MemoryFileStore::new();
        store.create_dir("/d", false).unwrap();
        assert!(store.remove("/d").is_err());
        assert_eq!(store.remove("/missing").unwrap_err(), VfsError::not_found("/missing"));
    }

    #[test]
    fn test_rename_moves_subtree() {
        let store = MemoryFileStore::new();
        store.write_file("/src/a/one", b"1").unwrap();
        store.write_file("/src/two", b"2").unwrap();
        store.rename("/src", "/dst").unwrap();
        assert!(!store.exists("/src"));
        assert_eq!(store.read_file("/dst/a/one").unwrap(), b"1");
        assert_eq!(store.read_file("/dst/two").unwrap(), b"2");
    }

    #[test]
    fn test_rename_onto_existing_fails() {
        let store = MemoryFileStore::new();
        store.write_file("/a", b"a").unwrap();
        store.write_file("/b", b"b").unwrap();
        assert_eq!(store.rename("/a", "/b").unwrap_err(), VfsError::already_exists("/b"));
        assert_eq!(store.read_file("/a").unwrap(), b"a");
        assert!(store.rename("/", "/r").is_err());
    }

    #[test]
    fn test_rename_into_itself_fails() {
        let store = MemoryFileStore::new();
        store.create_dir("/d", false).unwrap();
        assert!(store.rename("/d", "/d/e").is_err());
    }

    #[test]
    fn test_copy_is_independent() {
        let store = MemoryFileStore::new();
        store.write_file("/a", b"orig").unwrap();
        store.copy("/a", "/b").unwrap();
        store.write_file("/a", b"changed").unwrap();
        assert_eq!(store.read_file("/b").unwrap(), b"orig");
        assert!(store.copy("/a", "/b").is_err());
        assert!(store.copy("/missing", "/c").is_err());
    }

    #[test]
    fn test_hard_link_shares_content() {
        let store = MemoryFileStore::new();
        store.write_file("/a", b"data").unwrap();
        store.hard_link("/a", "/b").unwrap();
        store.write_file("/b", b"new").unwrap();
        assert_eq!(store.read_file("/a").unwrap(), b"new");
        store.remove("/a").unwrap();
        assert_eq!(store.read_file("/b").unwrap(), b"new");
    }

    #[test]
    fn test_symlinks_are_followed() {
        let store = MemoryFileStore::new();
        store.write_file("/real/file", b"x").unwrap();
        store.symlink("/real", "/alias").unwrap();
        store.symlink("file", "/real/rel").unwrap();

        assert_eq!(store.read_file("/alias/file").unwrap(), b"x");
        assert_eq!(store.read_file("/real/rel").unwrap(), b"x");
        assert_eq!(store.canonical_path("/alias/rel").unwrap(), "/real/file");
        assert_eq!(store.link_target("/real/rel").unwrap(), "/real/file");
        assert!(store.lookup("/alias", false).unwrap().0.is_symlink());
        assert!(store.lookup("/alias", true).unwrap().0.is_dir());
    }

    #[test]
    fn test_symlink_loop_is_bounded() {
        let store = MemoryFileStore::new();
        store.symlink("/b", "/a").unwrap();
        store.symlink("/a", "/b").unwrap();
        assert!(store.lookup("/a", true).is_none());
        assert!(store.canonical_path("/a").is_none());
        assert!(store.lookup("/a", false).is_some());
    }

    #[test]
    fn test_self_link_canonicalizes_to_directory() {
        let store = MemoryFileStore::new();
        store.create_dir("/d", false).unwrap();
        store.symlink(".", "/d/self").unwrap();
        assert_eq!(store.canonical_path("/d/self").unwrap(), "/d");
        assert_eq!(store.canonical_path("/d/self/self").unwrap(), "/d");
    }

    #[test]
    fn test_children_lists_direct_entries_only() {
        let store = MemoryFileStore::new();
        store.write_file("/d/a", b"").unwrap();
        store.write_file("/d/sub/b", b"").unwrap();
        store.write_file("/d-sibling", b"").unwrap();
        assert_eq!(
            store.children("/d").unwrap(),
            vec!["a".to_string(), "sub".to_string()]
        );
        assert!(store.children("/d/a").is_none());
    }

    #[test]
    fn test_owner_names_from_config() {
        let mut cfg = MemoryStoreConfig::default();
        cfg.default_user_id = 1000;
        cfg.users.insert(1000, "alice".into());
        let store = MemoryFileStore::with_config(cfg);
        let record = store.open_record("/f", true, false).unwrap();
        let uid = record.lock().user_id;
        assert_eq!(store.user_name(uid).as_deref(), Some("alice"));
        assert_eq!(store.group_name(0), None);
    }

    #[test]
    fn test_with_files() {
        let store = MemoryFileStore::with_files([
            ("/a.txt", b"content a".to_vec()),
            ("/b.txt", b"content b".to_vec()),
        ])
        .unwrap();
        assert_eq!(store.read_file("/a.txt").unwrap(), b"content a");
        assert_eq!(store.read_file("/b.txt").unwrap(), b"content b");
    }

    #[test]
    fn test_concurrent_lookup_or_create_yields_one_record() {
        let store = Arc::new(MemoryFileStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.open_record("/race", true, false).unwrap().id())
            })
            .collect();
        let ids: Vec<RecordId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }
}
