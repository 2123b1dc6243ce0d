//! Archive mounting
//!
//! [`ArchiveHandler`] makes a tar file on disk look like a directory: the
//! archive itself reports as a directory and its members show up as
//! read-only children (`/data/pack.tar/docs/readme.txt`).

use crate::engine::{record_error, DirIterable, EngineHandler, EntryNames, FileEngine};
use crate::error::{VfsError, VfsResult};
use crate::flags::{DirFilters, FileFlags, FileName, FileOwner, FileTime, OpenMode};
use crate::handle::FileHandle;
use crate::native::NativeEngine;
use crate::path;
use crate::store::store_key;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use vfe_config::ArchiveConfig;

const TARGET: &str = "vfe::engine";

/// Member links followed before giving up
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TarEntryKind {
    File,
    Directory,
    Symlink(String),
}

/// One member of an archive
#[derive(Debug, Clone)]
pub struct TarEntry {
    pub kind: TarEntryKind,
    /// Offset of the member's data in the archive file
    pub offset: u64,
    pub size: u64,
    pub mode: u32,
    pub mtime: u64,
    pub uid: u32,
    pub gid: u32,
}

impl TarEntry {
    fn implied_dir() -> Self {
        Self {
            kind: TarEntryKind::Directory,
            offset: 0,
            size: 0,
            mode: 0o755,
            mtime: 0,
            uid: 0,
            gid: 0,
        }
    }

    pub fn modified(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.mtime)
    }
}

/// Member table of a tar archive, keyed by `/`-anchored member path
#[derive(Debug, Default)]
pub struct TarIndex {
    entries: BTreeMap<String, TarEntry>,
}

impl TarIndex {
    /// Read the member table of the archive at `archive`
    pub fn load(archive: &str) -> VfsResult<Self> {
        let file = File::open(archive).map_err(|e| VfsError::from_io(&e, archive))?;
        let mut tar = tar::Archive::new(file);
        let mut index = TarIndex::default();
        index.entries.insert(String::from("/"), TarEntry::implied_dir());

        for entry in tar.entries().map_err(|e| VfsError::from_io(&e, archive))? {
            let entry = entry.map_err(|e| VfsError::from_io(&e, archive))?;
            let header = entry.header();
            let kind = match header.entry_type() {
                tar::EntryType::Directory => TarEntryKind::Directory,
                tar::EntryType::Symlink => {
                    let target = entry
                        .link_name()
                        .ok()
                        .flatten()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    TarEntryKind::Symlink(target)
                }
                tar::EntryType::Regular | tar::EntryType::Continuous => TarEntryKind::File,
                other => {
                    tracing::trace!(target: TARGET, archive, kind = ?other, "archive member skipped");
                    continue;
                }
            };
            let member = entry.path().map_err(|e| VfsError::from_io(&e, archive))?;
            let key = store_key(&member.to_string_lossy());
            if key == "/" {
                continue;
            }
            let record = TarEntry {
                kind,
                offset: entry.raw_file_position(),
                size: entry.size(),
                mode: header.mode().unwrap_or(0o644),
                mtime: header.mtime().unwrap_or(0),
                uid: header.uid().unwrap_or(0) as u32,
                gid: header.gid().unwrap_or(0) as u32,
            };
            index.insert(key, record);
        }
        tracing::debug!(target: TARGET, archive, members = index.entries.len() - 1, "archive indexed");
        Ok(index)
    }

    fn insert(&mut self, key: String, entry: TarEntry) {
        let mut parent = path::parent_path(&key);
        while parent != "/" && !self.entries.contains_key(&parent) {
            self.entries.insert(parent.clone(), TarEntry::implied_dir());
            parent = path::parent_path(&parent);
        }
        self.entries.insert(key, entry);
    }

    /// Member at `inner`, links not followed
    pub fn get(&self, inner: &str) -> Option<&TarEntry> {
        self.entries.get(&store_key(inner))
    }

    /// Member at `inner` with member links resolved, and its resolved path
    pub fn resolve(&self, inner: &str) -> Option<(String, &TarEntry)> {
        let mut key = store_key(inner);
        for _ in 0..MAX_LINK_HOPS {
            let entry = self.entries.get(&key)?;
            match &entry.kind {
                TarEntryKind::Symlink(target) => {
                    key = store_key(&path::join(&path::parent_path(&key), target));
                }
                _ => return Some((key, entry)),
            }
        }
        None
    }

    /// Names directly below the directory `inner`
    pub fn children(&self, inner: &str) -> Option<Vec<String>> {
        let (key, entry) = self.resolve(inner)?;
        if entry.kind != TarEntryKind::Directory {
            return None;
        }
        let prefix = if key == "/" { key } else { format!("{key}/") };
        Some(
            self.entries
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .filter_map(|(k, _)| {
                    let rest = &k[prefix.len()..];
                    (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}

type IndexCache = HashMap<String, (Option<SystemTime>, Arc<TarIndex>)>;

/// Handler mounting archives whose names end in one of the configured
/// suffixes.
///
/// Indexes are cached per archive path and reused until the archive's
/// modification time changes.
#[derive(Debug)]
pub struct ArchiveHandler {
    suffixes: Vec<String>,
    cache: Mutex<IndexCache>,
}

impl ArchiveHandler {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &ArchiveConfig) -> Self {
        Self::new(cfg.suffixes.iter().cloned())
    }

    fn is_archive_name(&self, segment: &str) -> bool {
        let lower = segment.to_ascii_lowercase();
        self.suffixes
            .iter()
            .any(|suffix| lower.len() > suffix.len() && lower.ends_with(suffix.as_str()))
    }

    /// Split `path` into the archive file on disk and the member path
    fn split<'a>(&self, path: &'a str) -> Option<(&'a str, &'a str)> {
        let mut end = 0;
        for segment in path.split('/') {
            let seg_end = end + segment.len();
            if self.is_archive_name(segment) {
                let archive = &path[..seg_end];
                if std::fs::metadata(archive).is_ok_and(|m| m.is_file()) {
                    let inner = &path[seg_end..];
                    return Some((archive, if inner.is_empty() { "/" } else { inner }));
                }
            }
            end = seg_end + 1;
            if end > path.len() {
                break;
            }
        }
        None
    }

    fn index(&self, archive: &str) -> Option<Arc<TarIndex>> {
        let mtime = std::fs::metadata(archive).ok()?.modified().ok();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, index)) = cache.get(archive) {
            if *cached == mtime {
                return Some(Arc::clone(index));
            }
        }
        match TarIndex::load(archive) {
            Ok(index) => {
                let index = Arc::new(index);
                cache.insert(archive.to_string(), (mtime, Arc::clone(&index)));
                Some(index)
            }
            Err(err) => {
                tracing::debug!(target: TARGET, archive, error = %err, "not mounting archive");
                cache.remove(archive);
                None
            }
        }
    }
}

impl Default for ArchiveHandler {
    fn default() -> Self {
        Self::from_config(&ArchiveConfig::default())
    }
}

impl EngineHandler for ArchiveHandler {
    fn create(&self, path: &str) -> Option<Box<dyn FileEngine>> {
        if path::is_resource_path(path) {
            return None;
        }
        let (archive, inner) = self.split(path)?;
        let index = self.index(archive)?;
        Some(Box::new(ArchiveEngine::new(path, archive, inner, index)))
    }
}

/// Engine for an archive (as a directory) or one of its members
#[derive(Debug)]
pub struct ArchiveEngine {
    name: String,
    archive: String,
    inner: String,
    index: Arc<TarIndex>,
    /// The archive file itself, for operations on the mount point
    native: NativeEngine,
    handle: Option<FileHandle<Arc<[u8]>>>,
    error: Option<VfsError>,
}

impl ArchiveEngine {
    pub fn new(name: &str, archive: &str, inner: &str, index: Arc<TarIndex>) -> Self {
        Self {
            name: name.to_string(),
            archive: archive.to_string(),
            inner: store_key(inner),
            index,
            native: NativeEngine::new(archive),
            handle: None,
            error: None,
        }
    }

    fn is_mount_point(&self) -> bool {
        self.inner == "/"
    }

    fn fail(&mut self, err: VfsError) -> bool {
        record_error(&mut self.error, err)
    }

    fn read_only(&mut self) -> bool {
        let err = VfsError::read_only(&self.name);
        self.fail(err)
    }

    fn member_path(&self, archive_path: &str, key: &str) -> String {
        if key == "/" {
            archive_path.to_string()
        } else {
            format!("{archive_path}{key}")
        }
    }

    fn load_member(&self, entry: &TarEntry) -> std::io::Result<Arc<[u8]>> {
        let mut file = File::open(&self.archive)?;
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut data = vec![0u8; entry.size as usize];
        file.read_exact(&mut data)?;
        Ok(data.into())
    }
}

impl FileEngine for ArchiveEngine {
    fn open(&mut self, mode: OpenMode) -> bool {
        if self.handle.is_some() {
            return self.fail(VfsError::AlreadyOpen { path: self.name.clone() });
        }
        if mode.is_writable() || mode.intersects(OpenMode::TRUNCATE | OpenMode::NEW_ONLY) {
            return self.read_only();
        }
        let entry = match self.index.resolve(&self.inner) {
            Some((_, entry)) => entry.clone(),
            None => {
                let err = VfsError::not_found(&self.name);
                return self.fail(err);
            }
        };
        if entry.kind != TarEntryKind::File {
            let err = VfsError::invalid_argument(&self.name, "is a directory");
            return self.fail(err);
        }
        match self.load_member(&entry) {
            Ok(data) => {
                self.handle = Some(FileHandle::new(mode, 0, data));
                self.error = None;
                true
            }
            Err(err) => {
                let err = VfsError::from_io(&err, &self.archive);
                self.fail(err)
            }
        }
    }

    fn close(&mut self) -> bool {
        match self.handle.take() {
            Some(_) => true,
            None => {
                let err = VfsError::not_open(&self.name);
                self.fail(err)
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> i64 {
        let outcome = match &mut self.handle {
            Some(handle) => {
                let data = Arc::clone(handle.backing());
                match handle.read_span(data.len(), buf.len()) {
                    Some(n) => {
                        let start = handle.position() as usize;
                        buf[..n].copy_from_slice(&data[start..start + n]);
                        handle.advance(n);
                        Ok(n as i64)
                    }
                    None => Err(VfsError::OutOfRange {
                        path: self.name.clone(),
                        position: handle.position(),
                    }),
                }
            }
            None => Err(VfsError::not_open(&self.name)),
        };
        outcome.unwrap_or_else(|err| {
            self.fail(err);
            -1
        })
    }

    fn write(&mut self, _data: &[u8]) -> i64 {
        self.read_only();
        -1
    }

    fn pos(&self) -> i64 {
        self.handle.as_ref().map(FileHandle::position).unwrap_or(-1)
    }

    fn seek(&mut self, pos: i64) -> bool {
        if pos < 0 {
            let err = VfsError::invalid_argument(&self.name, "negative position");
            return self.fail(err);
        }
        match &mut self.handle {
            Some(handle) => {
                handle.set_position(pos);
                true
            }
            None => {
                let err = VfsError::not_open(&self.name);
                self.fail(err)
            }
        }
    }

    fn size(&self) -> i64 {
        if self.is_mount_point() {
            return 0;
        }
        match self.index.resolve(&self.inner) {
            Some((_, entry)) if entry.kind == TarEntryKind::File => entry.size as i64,
            _ => 0,
        }
    }

    fn set_size(&mut self, _size: i64) -> bool {
        self.read_only()
    }

    fn remove(&mut self) -> bool {
        if self.is_mount_point() {
            return self.native.remove();
        }
        self.read_only()
    }

    fn copy(&mut self, new_name: &str) -> bool {
        if self.is_mount_point() {
            return self.native.copy(new_name);
        }
        let err = VfsError::unsupported(&self.name, "copy");
        self.fail(err)
    }

    fn rename(&mut self, new_name: &str) -> bool {
        if self.is_mount_point() {
            return self.native.rename(new_name);
        }
        self.read_only()
    }

    fn file_flags(&self, mask: FileFlags) -> FileFlags {
        if self.is_mount_point() {
            let disk = self.native.file_flags(FileFlags::everything());
            if !disk.contains(FileFlags::EXISTS) {
                return FileFlags::empty();
            }
            let mut flags = (disk - FileFlags::FILE_TYPE) | FileFlags::DIRECTORY_TYPE | FileFlags::EXISTS;
            if disk.contains(FileFlags::READ_OWNER) {
                flags |= FileFlags::EXE_OWNER;
            }
            if disk.contains(FileFlags::READ_USER) {
                flags |= FileFlags::EXE_USER;
            }
            return flags & mask;
        }

        let mut flags = FileFlags::empty();
        match self.index.get(&self.inner) {
            None => return flags,
            Some(entry) if matches!(entry.kind, TarEntryKind::Symlink(_)) => {
                flags |= FileFlags::LINK_TYPE;
            }
            Some(_) => {}
        }
        if let Some((_, entry)) = self.index.resolve(&self.inner) {
            flags |= FileFlags::EXISTS;
            flags |= match entry.kind {
                TarEntryKind::Directory => FileFlags::DIRECTORY_TYPE,
                _ => FileFlags::FILE_TYPE,
            };
            // members are never writable
            let perms = FileFlags::from_mode(entry.mode)
                - (FileFlags::WRITE_OWNER
                    | FileFlags::WRITE_USER
                    | FileFlags::WRITE_GROUP
                    | FileFlags::WRITE_OTHER);
            flags |= perms;
        }
        if path::file_name(&self.inner).starts_with('.') {
            flags |= FileFlags::HIDDEN;
        }
        flags & mask
    }

    fn file_name(&self, which: FileName) -> String {
        let absolute_archive = self.native.file_name(FileName::Absolute);
        match which {
            FileName::Default => self.name.clone(),
            FileName::Base => path::file_name(&self.name).to_string(),
            FileName::Path => path::parent_path(&self.name),
            FileName::Absolute => self.member_path(&absolute_archive, &self.inner),
            FileName::AbsolutePath => {
                path::parent_path(&self.member_path(&absolute_archive, &self.inner))
            }
            FileName::Canonical | FileName::CanonicalPath => {
                let canonical_archive = self.native.file_name(FileName::Canonical);
                match self.index.resolve(&self.inner) {
                    Some((key, _)) if !canonical_archive.is_empty() => {
                        let full = self.member_path(&canonical_archive, &key);
                        if which == FileName::Canonical {
                            full
                        } else {
                            path::parent_path(&full)
                        }
                    }
                    _ => String::new(),
                }
            }
            FileName::LinkTarget => match self.index.get(&self.inner).map(|e| &e.kind) {
                Some(TarEntryKind::Symlink(target)) => {
                    let key = store_key(&path::join(&path::parent_path(&self.inner), target));
                    self.member_path(&absolute_archive, &key)
                }
                _ if self.is_mount_point() => self.native.file_name(FileName::LinkTarget),
                _ => String::new(),
            },
        }
    }

    fn set_file_name(&mut self, name: &str) {
        if self.handle.is_some() {
            tracing::warn!(target: crate::engine::TARGET, path = %self.name, "cannot rename an open engine");
            return;
        }
        // stays bound to the same archive; only the member changes
        let prefix = format!("{}/", self.archive);
        if let Some(inner) = name.strip_prefix(&prefix) {
            self.inner = store_key(inner);
            self.name = name.to_string();
        } else if name == self.archive {
            self.inner = String::from("/");
            self.name = name.to_string();
        } else {
            tracing::warn!(target: crate::engine::TARGET, path = %name, archive = %self.archive, "name is outside the mounted archive");
        }
    }

    fn owner_id(&self, owner: FileOwner) -> Option<u32> {
        if self.is_mount_point() {
            return self.native.owner_id(owner);
        }
        let (_, entry) = self.index.resolve(&self.inner)?;
        Some(match owner {
            FileOwner::User => entry.uid,
            FileOwner::Group => entry.gid,
        })
    }

    fn file_time(&self, time: FileTime) -> Option<SystemTime> {
        if self.is_mount_point() {
            return self.native.file_time(time);
        }
        let (_, entry) = self.index.resolve(&self.inner)?;
        match time {
            FileTime::Modification | FileTime::MetadataChange => Some(entry.modified()),
            FileTime::Access | FileTime::Birth => None,
        }
    }

    fn is_relative_path(&self) -> bool {
        path::is_relative_path(&self.archive)
    }

    fn id(&self) -> Option<String> {
        let (key, _) = self.index.resolve(&self.inner)?;
        Some(format!("tar:{}:{}", self.native.id()?, key))
    }

    fn error(&self) -> Option<&VfsError> {
        // mount-point operations fail inside the native engine
        self.error.as_ref().or_else(|| self.native.error())
    }

    fn as_dir_iterable(&self) -> Option<&dyn DirIterable> {
        Some(self)
    }
}

impl DirIterable for ArchiveEngine {
    fn begin_entry_list(&self, _filters: DirFilters, _name_filters: &[String]) -> Option<EntryNames> {
        let names = self.index.children(&self.inner)?;
        Some(Box::new(names.into_iter()))
    }
}
