//! Resource bundle
//!
//! Byte blobs compiled into or registered by the application and addressed
//! through the `:/` namespace. Resources are read-only; directories exist
//! implicitly for every registered path.

use crate::engine::{record_error, DirIterable, EntryNames, FileEngine};
use crate::error::{VfsError, VfsResult};
use crate::flags::{DirFilters, FileFlags, FileName, FileTime, OpenMode};
use crate::handle::FileHandle;
use crate::path;
use crate::store::store_key;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

static GLOBAL: Lazy<Arc<ResourceBundle>> = Lazy::new(|| Arc::new(ResourceBundle::new()));

#[derive(Debug, Clone)]
enum ResourceNode {
    File { data: Arc<[u8]>, registered: SystemTime },
    Dir,
}

/// Key inside the bundle: `":/a/b"` and `":a/b"` both map to `"/a/b"`
fn resource_key(path: &str) -> String {
    store_key(path.strip_prefix(path::RESOURCE_PREFIX).unwrap_or(path))
}

/// Registered resources, keyed by path
#[derive(Debug)]
pub struct ResourceBundle {
    entries: RwLock<BTreeMap<String, ResourceNode>>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(String::from("/"), ResourceNode::Dir);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// The process-wide bundle
    pub fn global() -> Arc<ResourceBundle> {
        Arc::clone(&GLOBAL)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, ResourceNode>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, ResourceNode>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add (or replace) the resource at `path`.
    ///
    /// Missing parent directories appear implicitly.
    pub fn register(&self, path: &str, data: impl Into<Arc<[u8]>>) -> VfsResult<()> {
        let key = resource_key(path);
        if key == "/" {
            return Err(VfsError::InvalidPath {
                path: path.to_string(),
                reason: String::from("resource root cannot hold data"),
            });
        }
        let mut entries = self.write();
        if matches!(entries.get(&key), Some(ResourceNode::Dir)) {
            return Err(VfsError::already_exists(path));
        }

        let mut parent = path::parent_path(&key);
        while parent != "/" {
            match entries.get(&parent) {
                Some(ResourceNode::File { .. }) => {
                    return Err(VfsError::InvalidPath {
                        path: path.to_string(),
                        reason: format!("'{parent}' is a file"),
                    })
                }
                Some(ResourceNode::Dir) => break,
                None => {
                    entries.insert(parent.clone(), ResourceNode::Dir);
                }
            }
            parent = path::parent_path(&parent);
        }
        entries.insert(
            key,
            ResourceNode::File {
                data: data.into(),
                registered: SystemTime::now(),
            },
        );
        Ok(())
    }

    /// Remove the resource at `path`; directories left empty go too
    pub fn unregister(&self, path: &str) -> bool {
        let key = resource_key(path);
        let mut entries = self.write();
        if !matches!(entries.get(&key), Some(ResourceNode::File { .. })) {
            return false;
        }
        entries.remove(&key);

        let mut parent = path::parent_path(&key);
        while parent != "/" && children_of(&entries, &parent).is_empty() {
            entries.remove(&parent);
            parent = path::parent_path(&parent);
        }
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read().contains_key(&resource_key(path))
    }

    fn node(&self, path: &str) -> Option<ResourceNode> {
        self.read().get(&resource_key(path)).cloned()
    }

    /// Content of the resource file at `path`
    pub fn data(&self, path: &str) -> Option<Arc<[u8]>> {
        match self.node(path)? {
            ResourceNode::File { data, .. } => Some(data),
            ResourceNode::Dir => None,
        }
    }

    /// Names of the entries directly below the directory `path`
    pub fn children(&self, path: &str) -> Option<Vec<String>> {
        let key = resource_key(path);
        let entries = self.read();
        match entries.get(&key) {
            Some(ResourceNode::Dir) => Some(children_of(&entries, &key)),
            _ => None,
        }
    }
}

impl Default for ResourceBundle {
    fn default() -> Self {
        Self::new()
    }
}

fn children_of(entries: &BTreeMap<String, ResourceNode>, key: &str) -> Vec<String> {
    let prefix = if key.ends_with('/') {
        key.to_string()
    } else {
        format!("{key}/")
    };
    entries
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .filter_map(|(k, _)| {
            let rest = &k[prefix.len()..];
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        })
        .collect()
}

/// Read-only engine over a [`ResourceBundle`] entry
#[derive(Debug)]
pub struct ResourceEngine {
    bundle: Arc<ResourceBundle>,
    name: String,
    handle: Option<FileHandle<Arc<[u8]>>>,
    error: Option<VfsError>,
}

impl ResourceEngine {
    pub fn new(bundle: Arc<ResourceBundle>, name: &str) -> Self {
        Self {
            bundle,
            name: name.to_string(),
            handle: None,
            error: None,
        }
    }

    fn fail(&mut self, err: VfsError) -> bool {
        record_error(&mut self.error, err)
    }

    fn read_only(&mut self) -> bool {
        let err = VfsError::read_only(&self.name);
        self.fail(err)
    }

    fn absolute(&self) -> String {
        let key = resource_key(&self.name);
        format!("{}{}", path::RESOURCE_PREFIX, key)
    }
}

impl FileEngine for ResourceEngine {
    fn open(&mut self, mode: OpenMode) -> bool {
        if self.handle.is_some() {
            return self.fail(VfsError::AlreadyOpen { path: self.name.clone() });
        }
        if mode.is_writable() || mode.intersects(OpenMode::TRUNCATE | OpenMode::NEW_ONLY) {
            return self.read_only();
        }
        match self.bundle.node(&self.name) {
            Some(ResourceNode::File { data, .. }) => {
                self.handle = Some(FileHandle::new(mode, 0, data));
                self.error = None;
                true
            }
            Some(ResourceNode::Dir) => {
                let err = VfsError::invalid_argument(&self.name, "is a directory");
                self.fail(err)
            }
            None => {
                let err = VfsError::not_found(&self.name);
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
        match &self.handle {
            Some(handle) => handle.backing().len() as i64,
            None => self.bundle.data(&self.name).map(|d| d.len() as i64).unwrap_or(0),
        }
    }

    fn set_size(&mut self, _size: i64) -> bool {
        self.read_only()
    }

    fn remove(&mut self) -> bool {
        self.read_only()
    }

    fn copy(&mut self, _new_name: &str) -> bool {
        let err = VfsError::unsupported(&self.name, "copy");
        self.fail(err)
    }

    fn rename(&mut self, _new_name: &str) -> bool {
        self.read_only()
    }

    fn file_flags(&self, mask: FileFlags) -> FileFlags {
        let read = FileFlags::READ_OWNER
            | FileFlags::READ_USER
            | FileFlags::READ_GROUP
            | FileFlags::READ_OTHER;
        let exe = FileFlags::EXE_OWNER | FileFlags::EXE_USER | FileFlags::EXE_GROUP | FileFlags::EXE_OTHER;

        let mut flags = match self.bundle.node(&self.name) {
            Some(ResourceNode::File { .. }) => FileFlags::FILE_TYPE | read,
            Some(ResourceNode::Dir) => FileFlags::DIRECTORY_TYPE | read | exe,
            None => return FileFlags::empty(),
        };
        flags |= FileFlags::EXISTS;
        let key = resource_key(&self.name);
        if key == "/" {
            flags |= FileFlags::ROOT;
        }
        if path::file_name(&key).starts_with('.') {
            flags |= FileFlags::HIDDEN;
        }
        flags & mask
    }

    fn file_name(&self, which: FileName) -> String {
        match which {
            FileName::Default => self.name.clone(),
            FileName::Base => path::file_name(&self.name).to_string(),
            FileName::Path => path::parent_path(&self.name),
            FileName::Absolute => self.absolute(),
            FileName::AbsolutePath => path::parent_path(&self.absolute()),
            FileName::Canonical if self.bundle.contains(&self.name) => self.absolute(),
            FileName::CanonicalPath if self.bundle.contains(&self.name) => {
                path::parent_path(&self.absolute())
            }
            FileName::Canonical | FileName::CanonicalPath | FileName::LinkTarget => String::new(),
        }
    }

    fn set_file_name(&mut self, name: &str) {
        if self.handle.is_some() {
            tracing::warn!(target: crate::engine::TARGET, path = %self.name, "cannot rename an open engine");
            return;
        }
        self.name = name.to_string();
    }

    fn file_time(&self, time: FileTime) -> Option<SystemTime> {
        match (time, self.bundle.node(&self.name)?) {
            (FileTime::Modification | FileTime::Birth, ResourceNode::File { registered, .. }) => {
                Some(registered)
            }
            _ => None,
        }
    }

    fn is_relative_path(&self) -> bool {
        false
    }

    fn id(&self) -> Option<String> {
        self.bundle
            .contains(&self.name)
            .then(|| format!("res:{}", resource_key(&self.name)))
    }

    fn error(&self) -> Option<&VfsError> {
        self.error.as_ref()
    }

    fn as_dir_iterable(&self) -> Option<&dyn DirIterable> {
        Some(self)
    }
}

impl DirIterable for ResourceEngine {
    fn begin_entry_list(&self, _filters: DirFilters, _name_filters: &[String]) -> Option<EntryNames> {
        let names = self.bundle.children(&self.name)?;
        Some(Box::new(names.into_iter()))
    }
}
