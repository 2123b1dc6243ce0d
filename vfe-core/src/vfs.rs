//! The [`VirtualFileSystem`] implementation over the engine layer

use crate::dir::Dir;
use crate::engine::{failure, EngineHandler, FileEngine};
use crate::error::{VfsError, VfsResult};
use crate::file::File;
use crate::file_info::FileInfo;
use crate::flags::{DirFilters, FileFlags, IteratorFlags, OpenMode};
use crate::iterator::DirIterator;
use crate::memory::MemoryHandler;
use crate::r#trait::VirtualFileSystem;
use crate::registry::HandlerGuard;
use crate::resolver::EngineResolver;
use crate::store::MemoryFileStore;
use std::path::Path;
use std::sync::Arc;

const TARGET: &str = "vfe::engine";

/// File system view through an [`EngineResolver`].
///
/// Handlers mounted through [`mount`](Self::mount) stay registered for as
/// long as the `Vfs` lives.
#[derive(Debug)]
pub struct Vfs {
    resolver: EngineResolver,
    mounts: Vec<HandlerGuard>,
}

fn as_str(path: &Path) -> VfsResult<&str> {
    path.to_str().ok_or_else(|| VfsError::InvalidPath {
        path: path.to_string_lossy().into_owned(),
        reason: String::from("not valid UTF-8"),
    })
}

impl Vfs {
    pub fn new(resolver: EngineResolver) -> Self {
        Self {
            resolver,
            mounts: Vec::new(),
        }
    }

    /// View through the process-wide resolver
    pub fn global() -> Self {
        Self::new(EngineResolver::global())
    }

    /// Private view where every non-resource path lives in `store`
    pub fn memory(store: Arc<MemoryFileStore>) -> Self {
        let mut vfs = Self::new(EngineResolver::isolated());
        vfs.mount(MemoryHandler::new(store));
        vfs
    }

    /// Put `handler` in front of this view's handler chain
    pub fn mount<H>(&mut self, handler: H)
    where
        H: EngineHandler + 'static,
    {
        let guard = self.resolver.registry().register(handler);
        self.mounts.push(guard);
    }

    pub fn resolver(&self) -> &EngineResolver {
        &self.resolver
    }

    pub fn engine(&self, path: &str) -> Box<dyn FileEngine> {
        self.resolver.create(path)
    }

    pub fn open(&self, path: &str, mode: OpenMode) -> VfsResult<File> {
        File::open(&self.resolver, path, mode)
    }

    pub fn file_info(&self, path: &str) -> FileInfo {
        FileInfo::with_resolver(self.resolver.clone(), path)
    }

    pub fn iter(&self, path: &str, filters: DirFilters, flags: IteratorFlags) -> DirIterator {
        DirIterator::new(self.resolver.clone(), path, filters, flags)
    }

    pub fn dir(&self, path: &str) -> Dir {
        Dir::with_resolver(self.resolver.clone(), path)
    }

    fn flags(&self, path: &Path) -> FileFlags {
        match as_str(path) {
            Ok(path) => self.engine(path).file_flags(FileFlags::everything()),
            Err(_) => FileFlags::empty(),
        }
    }

    fn engine_op<F>(&self, path: &Path, operation: &str, op: F) -> VfsResult<()>
    where
        F: FnOnce(&mut dyn FileEngine, &str) -> bool,
    {
        let path = self.resolver.clean(as_str(path)?);
        let mut engine = self.engine(&path);
        if op(engine.as_mut(), &path) {
            Ok(())
        } else {
            Err(failure(engine.as_ref(), &path, operation))
        }
    }

    fn stream_copy(&self, from: &str, to: &str) -> VfsResult<()> {
        tracing::debug!(target: TARGET, from, to, "copying through a stream");
        let content = self.open(from, OpenMode::READ)?.read_all()?;
        let mut out = self.open(to, OpenMode::WRITE | OpenMode::NEW_ONLY)?;
        out.write_all_bytes(&content)?;
        out.close()
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::global()
    }
}

impl VirtualFileSystem for Vfs {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.open(as_str(path)?, OpenMode::READ)?.read_all()
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let mut file = self.open(as_str(path)?, OpenMode::WRITE | OpenMode::TRUNCATE)?;
        file.write_all_bytes(content)?;
        file.close()
    }

    fn exists(&self, path: &Path) -> bool {
        self.flags(path).contains(FileFlags::EXISTS)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.flags(path).contains(FileFlags::EXISTS | FileFlags::FILE_TYPE)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.flags(path).contains(FileFlags::EXISTS | FileFlags::DIRECTORY_TYPE)
    }

    fn remove(&self, path: &Path) -> VfsResult<()> {
        self.engine_op(path, "remove", |engine, _| engine.remove())
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let to = self.resolver.clean(as_str(to)?);
        self.engine_op(from, "rename", |engine, _| engine.rename(&to))
    }

    fn copy(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let to = self.resolver.clean(as_str(to)?);
        match self.engine_op(from, "copy", |engine, _| engine.copy(&to)) {
            Err(VfsError::Unsupported { .. }) | Err(VfsError::ReadOnly { .. }) => {
                let from = self.resolver.clean(as_str(from)?);
                self.stream_copy(&from, &to)
            }
            other => other,
        }
    }

    fn create_dir(&self, path: &Path, parents: bool) -> VfsResult<()> {
        self.engine_op(path, "create_dir", |engine, path| engine.mkdir(path, parents))
    }

    fn remove_dir(&self, path: &Path) -> VfsResult<()> {
        self.engine_op(path, "remove_dir", |engine, path| engine.rmdir(path, false))
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        let path = as_str(path)?;
        let mut dir = self.dir(path);
        if !dir.exists() {
            return Err(VfsError::not_found(path));
        }
        dir.set_filters(DirFilters::ALL_ENTRIES | DirFilters::HIDDEN | DirFilters::NO_DOT_AND_DOT_DOT);
        Ok(dir.entry_list())
    }
}
