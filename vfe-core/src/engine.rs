//! The file-engine contract
//!
//! Every backend (native disk, in-memory store, mounted archive, resource
//! bundle) implements [`FileEngine`]. Engines are bound to one path when
//! they are created and report failure through `false` / `-1`; the reason
//! of the last failure is kept and available through
//! [`FileEngine::error`].

use crate::error::VfsError;
use crate::flags::{DirFilters, FileFlags, FileName, FileOwner, FileTime, OpenMode};
use std::time::SystemTime;

pub(crate) const TARGET: &str = "vfe::engine";

/// Names of the children of a directory, in backend order.
pub type EntryNames = Box<dyn Iterator<Item = String> + Send>;

/// Optional capability: enumerate the children of the engine's path.
///
/// Engines without it have no children; that is not an error.
pub trait DirIterable {
    /// Start listing the direct children of the engine's path.
    ///
    /// `filters` and `name_filters` are hints; callers filter again. `None`
    /// means the path cannot be listed.
    fn begin_entry_list(&self, filters: DirFilters, name_filters: &[String]) -> Option<EntryNames>;
}

/// Operations every backend supports.
///
/// Optional operations come with defaults that refuse (`false`, `None`,
/// empty).
pub trait FileEngine: Send {
    /// Open the bound path. Fails when the engine is already open.
    fn open(&mut self, mode: OpenMode) -> bool;

    fn close(&mut self) -> bool;

    fn flush(&mut self) -> bool {
        true
    }

    /// Copy bytes at the cursor into `buf`; `-1` when not readable or when
    /// the cursor lies past the end.
    fn read(&mut self, buf: &mut [u8]) -> i64;

    /// Write `data` at the cursor, growing the file as needed.
    fn write(&mut self, data: &[u8]) -> i64;

    /// Cursor position, `-1` when not open
    fn pos(&self) -> i64;

    fn seek(&mut self, pos: i64) -> bool;

    /// Current length; `0` for a missing file
    fn size(&self) -> i64;

    fn set_size(&mut self, size: i64) -> bool;

    fn remove(&mut self) -> bool;

    fn copy(&mut self, new_name: &str) -> bool;

    fn rename(&mut self, new_name: &str) -> bool;

    fn link(&mut self, _new_name: &str) -> bool {
        false
    }

    fn mkdir(&mut self, _dir: &str, _create_parents: bool) -> bool {
        false
    }

    fn rmdir(&mut self, _dir: &str, _recurse_parents: bool) -> bool {
        false
    }

    /// Flags of the bound path intersected with `mask`
    fn file_flags(&self, mask: FileFlags) -> FileFlags;

    fn set_permissions(&mut self, _perms: FileFlags) -> bool {
        false
    }

    fn file_name(&self, which: FileName) -> String;

    /// Rebind the engine to another path; ignored while open
    fn set_file_name(&mut self, name: &str);

    fn owner_id(&self, _owner: FileOwner) -> Option<u32> {
        None
    }

    fn owner(&self, _owner: FileOwner) -> Option<String> {
        None
    }

    fn file_time(&self, _time: FileTime) -> Option<SystemTime> {
        None
    }

    fn set_file_time(&mut self, _time: SystemTime, _which: FileTime) -> bool {
        false
    }

    fn is_relative_path(&self) -> bool {
        crate::path::is_relative_path(&self.file_name(FileName::Default))
    }

    fn case_sensitive(&self) -> bool {
        true
    }

    /// Identity of the underlying object, equal for links to the same data
    fn id(&self) -> Option<String> {
        None
    }

    /// Reason of the last failed operation
    fn error(&self) -> Option<&VfsError>;

    fn as_dir_iterable(&self) -> Option<&dyn DirIterable> {
        None
    }
}

/// Produces engines for the paths it recognizes.
pub trait EngineHandler: Send + Sync {
    /// `Some` claims `path`; the registry asks no one else afterwards.
    fn create(&self, path: &str) -> Option<Box<dyn FileEngine>>;
}

impl<F> EngineHandler for F
where
    F: Fn(&str) -> Option<Box<dyn FileEngine>> + Send + Sync,
{
    fn create(&self, path: &str) -> Option<Box<dyn FileEngine>> {
        self(path)
    }
}

/// Record `err` as the engine's last error.
///
/// Misuse (wrong state, bad argument) is a developer mistake and gets a
/// warning; ordinary failures only a debug line.
pub(crate) fn record_error(slot: &mut Option<VfsError>, err: VfsError) -> bool {
    match &err {
        VfsError::NotOpen { .. }
        | VfsError::AlreadyOpen { .. }
        | VfsError::InvalidArgument { .. }
        | VfsError::OutOfRange { .. } => {
            tracing::warn!(target: TARGET, error = %err, "file engine misuse");
        }
        _ => {
            tracing::debug!(target: TARGET, error = %err, "file engine operation failed");
        }
    }
    *slot = Some(err);
    false
}

/// Error to report once `engine` has refused `operation` on `path`.
///
/// Engines that refuse through a default method leave no error behind;
/// those count as unsupported.
pub(crate) fn failure(engine: &dyn FileEngine, path: &str, operation: &str) -> VfsError {
    engine
        .error()
        .cloned()
        .unwrap_or_else(|| VfsError::unsupported(path, operation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_keeps_last() {
        let mut slot = None;
        assert!(!record_error(&mut slot, VfsError::not_open("/a")));
        assert!(!record_error(&mut slot, VfsError::not_found("/b")));
        assert_eq!(slot, Some(VfsError::not_found("/b")));
    }

    #[test]
    fn test_closure_handler_declines() {
        let handler = |_: &str| -> Option<Box<dyn FileEngine>> { None };
        assert!(EngineHandler::create(&handler, "/x").is_none());
    }
}
