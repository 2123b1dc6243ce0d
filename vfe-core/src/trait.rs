//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;
use std::vec::Vec;

/// Whole-file operations over some file system.
///
/// Decouples callers from where the bytes live; [`Vfs`](crate::Vfs)
/// implements it on top of the engine layer, so the same calls reach the
/// disk, memory stores, archives and resources.
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path exists and is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Remove a file or link
    fn remove(&self, path: &Path) -> VfsResult<()>;

    /// Move `from` to `to`; fails when `to` exists
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Copy the contents of `from` into a new file `to`
    fn copy(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Create a directory, with its missing parents when `parents` is set
    fn create_dir(&self, path: &Path, parents: bool) -> VfsResult<()>;

    /// Remove an empty directory
    fn remove_dir(&self, path: &Path) -> VfsResult<()>;

    /// Names of the entries in a directory, sorted
    fn list_dir(&self, path: &Path) -> VfsResult<Vec<String>>;
}
