//! vfe core: pluggable file engines
//!
//! Every path is served by a [`FileEngine`]. An [`EngineResolver`]
//! normalizes the path, asks the registered [`EngineHandler`]s (newest
//! first) whether they claim it and falls back to the resource bundle or
//! the native file system. On top of the engines sit [`FileInfo`],
//! [`DirIterator`], [`Dir`], [`File`] and the [`VirtualFileSystem`]
//! implementation [`Vfs`].
//!
//! Backends shipped here:
//! - [`NativeEngine`]: the operating system's file system
//! - [`MemoryEngine`] over a shared [`MemoryFileStore`]
//! - [`ArchiveEngine`]: `.tar` files mounted as read-only directories
//! - [`ResourceEngine`]: read-only blobs under `:/`
//!
//! # Usage
//! ```rust,ignore
//! use vfe_core::{MemoryFileStore, Vfs, VirtualFileSystem};
//! use std::{path::Path, sync::Arc};
//!
//! let fs = Vfs::memory(Arc::new(MemoryFileStore::new()));
//! fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
//! let content = fs.read_file(Path::new("/test.txt")).unwrap();
//! ```

mod archive;
mod dir;
mod engine;
mod error;
mod file;
mod file_info;
mod flags;
pub mod glob;
mod handle;
mod iterator;
mod memory;
mod native;
pub mod path;
mod registry;
mod resolver;
mod resource;
mod store;
mod r#trait;
mod vfs;

pub use archive::{ArchiveEngine, ArchiveHandler, TarEntry, TarEntryKind, TarIndex};
pub use dir::{sort_entries, Dir};
pub use engine::{DirIterable, EngineHandler, EntryNames, FileEngine};
pub use error::{VfsError, VfsResult};
pub use file::File;
pub use file_info::FileInfo;
pub use flags::{
    DirFilters, FileFlags, FileName, FileOwner, FileTime, IteratorFlags, OpenMode, SortFlags,
    SortKey,
};
pub use handle::FileHandle;
pub use iterator::DirIterator;
pub use memory::{MemoryEngine, MemoryHandler};
pub use native::NativeEngine;
pub use path::{clean_path, is_relative_path, CleanFlags};
pub use registry::{HandlerGuard, HandlerRegistry};
pub use resolver::EngineResolver;
pub use resource::{ResourceBundle, ResourceEngine};
pub use store::{store_key, FileData, FileRecord, MemoryFileStore, NodeKind, RecordId};
pub use r#trait::VirtualFileSystem;
pub use vfs::Vfs;

/// File system view over an empty in-memory store
pub fn memory_vfs() -> Vfs {
    Vfs::memory(std::sync::Arc::new(MemoryFileStore::new()))
}

/// File system view through the process-wide resolver
pub fn native_vfs() -> Vfs {
    Vfs::global()
}
