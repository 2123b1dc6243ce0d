//! Native OS file engine
//!
//! The fallback for every path no registered handler claims. A thin
//! wrapper over `std::fs`; OS failures are folded into [`VfsError`] and
//! reported as `false` / `-1` like every other engine.

use crate::engine::{record_error, DirIterable, EntryNames, FileEngine};
use crate::error::VfsError;
use crate::flags::{DirFilters, FileFlags, FileName, FileOwner, FileTime, OpenMode};
use crate::handle::FileHandle;
use crate::path;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;

/// Engine for a path on the local disk
#[derive(Debug)]
pub struct NativeEngine {
    name: String,
    handle: Option<FileHandle<File>>,
    error: Option<VfsError>,
}

impl NativeEngine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handle: None,
            error: None,
        }
    }

    fn fail(&mut self, err: VfsError) -> bool {
        record_error(&mut self.error, err)
    }

    fn fail_io(&mut self, err: std::io::Error) -> bool {
        let err = VfsError::from_io(&err, &self.name);
        self.fail(err)
    }

    fn outcome(&mut self, result: std::io::Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => self.fail_io(err),
        }
    }

    fn absolute(&self) -> String {
        if path::is_absolute_path(&self.name) {
            return path::clean_path(&self.name);
        }
        match std::env::current_dir() {
            Ok(cwd) => {
                let cwd = path::from_native_separators(&cwd.to_string_lossy());
                path::clean_path(&path::join(&cwd, &self.name))
            }
            Err(_) => path::clean_path(&self.name),
        }
    }

    fn canonical(&self) -> Option<String> {
        let canonical = fs::canonicalize(&self.name).ok()?;
        Some(path::from_native_separators(&canonical.to_string_lossy()))
    }

    fn occupied(target: &str) -> bool {
        fs::symlink_metadata(target).is_ok()
    }
}

impl FileEngine for NativeEngine {
    fn open(&mut self, mode: OpenMode) -> bool {
        if self.handle.is_some() {
            return self.fail(VfsError::AlreadyOpen { path: self.name.clone() });
        }
        if mode.is_empty() {
            return self.fail(VfsError::invalid_argument(&self.name, "empty open mode"));
        }
        if fs::metadata(&self.name).is_ok_and(|m| m.is_dir()) {
            return self.fail(VfsError::invalid_argument(&self.name, "is a directory"));
        }

        let writable = mode.is_writable() || mode.contains(OpenMode::NEW_ONLY);
        let mut options = OpenOptions::new();
        options
            .read(mode.contains(OpenMode::READ))
            .write(writable)
            .append(mode.contains(OpenMode::APPEND))
            .truncate(writable && mode.truncates() && !mode.contains(OpenMode::APPEND));
        if mode.contains(OpenMode::NEW_ONLY) {
            options.create_new(true);
        } else if writable && !mode.contains(OpenMode::EXISTING_ONLY) {
            options.create(true);
        }

        let file = match options.open(&self.name) {
            Ok(file) => file,
            Err(err) => return self.fail_io(err),
        };
        let position = if mode.contains(OpenMode::APPEND) {
            file.metadata().map(|m| m.len() as i64).unwrap_or(0)
        } else {
            0
        };
        self.handle = Some(FileHandle::new(mode, position, file));
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
        let result = match &mut self.handle {
            Some(handle) => handle.backing_mut().flush(),
            None => return self.fail(VfsError::not_open(&self.name)),
        };
        self.outcome(result)
    }

    fn read(&mut self, buf: &mut [u8]) -> i64 {
        let handle = match &mut self.handle {
            Some(handle) if handle.can_read() => handle,
            Some(_) => {
                self.fail(VfsError::invalid_argument(&self.name, "not open for reading"));
                return -1;
            }
            None => {
                self.fail(VfsError::not_open(&self.name));
                return -1;
            }
        };

        let len = match handle.backing().metadata() {
            Ok(meta) => meta.len() as usize,
            Err(err) => {
                self.fail_io(err);
                return -1;
            }
        };
        let wanted = match handle.read_span(len, buf.len()) {
            Some(n) => n,
            None => {
                let position = handle.position();
                self.fail(VfsError::OutOfRange { path: self.name.clone(), position });
                return -1;
            }
        };

        let position = handle.position() as u64;
        let file = handle.backing_mut();
        let result = file.seek(SeekFrom::Start(position)).and_then(|_| {
            let mut total = 0;
            while total < wanted {
                match file.read(&mut buf[total..wanted])? {
                    0 => break,
                    n => total += n,
                }
            }
            Ok(total)
        });
        match result {
            Ok(n) => {
                handle.advance(n);
                n as i64
            }
            Err(err) => {
                self.fail_io(err);
                -1
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> i64 {
        let handle = match &mut self.handle {
            Some(handle) if handle.can_write() => handle,
            Some(_) => {
                self.fail(VfsError::invalid_argument(&self.name, "not open for writing"));
                return -1;
            }
            None => {
                self.fail(VfsError::not_open(&self.name));
                return -1;
            }
        };

        let append = handle.mode().contains(OpenMode::APPEND);
        let position = handle.position() as u64;
        let file = handle.backing_mut();
        let result = if append {
            file.write_all(data)
                .and_then(|_| file.metadata())
                .map(|meta| meta.len() as i64)
        } else {
            file.seek(SeekFrom::Start(position))
                .and_then(|_| file.write_all(data))
                .map(|_| position as i64 + data.len() as i64)
        };
        match result {
            Ok(end) => {
                handle.set_position(end);
                data.len() as i64
            }
            Err(err) => {
                self.fail_io(err);
                -1
            }
        }
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
        let meta = match &self.handle {
            Some(handle) => handle.backing().metadata(),
            None => fs::metadata(&self.name),
        };
        meta.map(|m| m.len() as i64).unwrap_or(0)
    }

    fn set_size(&mut self, size: i64) -> bool {
        if size < 0 {
            return self.fail(VfsError::invalid_argument(&self.name, "negative size"));
        }
        let result = match &mut self.handle {
            Some(handle) => {
                let result = handle.backing().set_len(size as u64);
                if result.is_ok() {
                    handle.clamp_to(size);
                }
                result
            }
            None => OpenOptions::new()
                .write(true)
                .open(&self.name)
                .and_then(|file| file.set_len(size as u64)),
        };
        self.outcome(result) && self.size() == size
    }

    fn remove(&mut self) -> bool {
        let result = fs::remove_file(&self.name);
        self.outcome(result)
    }

    fn copy(&mut self, new_name: &str) -> bool {
        if Self::occupied(new_name) {
            return self.fail(VfsError::already_exists(new_name));
        }
        let result = fs::copy(&self.name, new_name).map(|_| ());
        self.outcome(result)
    }

    fn rename(&mut self, new_name: &str) -> bool {
        if !Self::occupied(&self.name) {
            return self.fail(VfsError::not_found(&self.name));
        }
        let is_file = fs::symlink_metadata(&self.name).is_ok_and(|meta| meta.is_file());
        if is_file {
            // link(2) refuses an existing destination atomically, rename(2)
            // would replace it
            match fs::hard_link(&self.name, new_name) {
                Ok(()) => {
                    let result = fs::remove_file(&self.name);
                    return self.outcome(result);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    return self.fail(VfsError::already_exists(new_name));
                }
                Err(err) => {
                    tracing::debug!(target: crate::engine::TARGET, path = %self.name, error = %err, "hard link refused, renaming");
                }
            }
        }
        if Self::occupied(new_name) {
            return self.fail(VfsError::already_exists(new_name));
        }
        let result = fs::rename(&self.name, new_name);
        self.outcome(result)
    }

    fn link(&mut self, new_name: &str) -> bool {
        if Self::occupied(new_name) {
            return self.fail(VfsError::already_exists(new_name));
        }
        let target = self.absolute();
        #[cfg(unix)]
        let result = std::os::unix::fs::symlink(&target, new_name);
        #[cfg(windows)]
        let result = std::os::windows::fs::symlink_file(&target, new_name);
        #[cfg(not(any(unix, windows)))]
        let result: std::io::Result<()> = {
            let _ = target;
            return self.fail(VfsError::unsupported(&self.name, "link"));
        };
        self.outcome(result)
    }

    fn mkdir(&mut self, dir: &str, create_parents: bool) -> bool {
        let result = if create_parents {
            fs::create_dir_all(dir)
        } else {
            fs::create_dir(dir)
        };
        self.outcome(result)
    }

    fn rmdir(&mut self, dir: &str, recurse_parents: bool) -> bool {
        if let Err(err) = fs::remove_dir(dir) {
            return self.fail_io(err);
        }
        if recurse_parents {
            let mut parent = Path::new(dir).parent();
            while let Some(p) = parent {
                if p.as_os_str().is_empty() || fs::remove_dir(p).is_err() {
                    break;
                }
                parent = p.parent();
            }
        }
        true
    }

    fn file_flags(&self, mask: FileFlags) -> FileFlags {
        let mut flags = FileFlags::empty();
        let link_meta = match fs::symlink_metadata(&self.name) {
            Ok(meta) => meta,
            Err(_) => return flags,
        };
        if link_meta.file_type().is_symlink() {
            flags |= FileFlags::LINK_TYPE;
        }

        if let Ok(meta) = fs::metadata(&self.name) {
            flags |= FileFlags::EXISTS | FileFlags::LOCAL_DISK;
            if meta.is_dir() {
                flags |= FileFlags::DIRECTORY_TYPE;
            } else {
                flags |= FileFlags::FILE_TYPE;
            }
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                flags |= FileFlags::from_mode(meta.permissions().mode());
            }
            #[cfg(not(unix))]
            {
                flags |= FileFlags::READ_OWNER
                    | FileFlags::READ_USER
                    | FileFlags::READ_GROUP
                    | FileFlags::READ_OTHER;
                if !meta.permissions().readonly() {
                    flags |= FileFlags::WRITE_OWNER
                        | FileFlags::WRITE_USER
                        | FileFlags::WRITE_GROUP
                        | FileFlags::WRITE_OTHER;
                }
            }
        }

        let absolute = self.absolute();
        if absolute == "/" {
            flags |= FileFlags::ROOT;
        }
        if path::file_name(&absolute).starts_with('.') {
            flags |= FileFlags::HIDDEN;
        }
        flags & mask
    }

    fn set_permissions(&mut self, perms: FileFlags) -> bool {
        #[cfg(unix)]
        let result = {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.name, fs::Permissions::from_mode(perms.to_mode()))
        };
        #[cfg(not(unix))]
        let result = fs::metadata(&self.name).and_then(|meta| {
            let mut permissions = meta.permissions();
            permissions.set_readonly(!perms.contains(FileFlags::WRITE_OWNER));
            fs::set_permissions(&self.name, permissions)
        });
        self.outcome(result)
    }

    fn file_name(&self, which: FileName) -> String {
        match which {
            FileName::Default => self.name.clone(),
            FileName::Base => path::file_name(&self.name).to_string(),
            FileName::Path => path::parent_path(&self.name),
            FileName::Absolute => self.absolute(),
            FileName::AbsolutePath => path::parent_path(&self.absolute()),
            FileName::Canonical => self.canonical().unwrap_or_default(),
            FileName::CanonicalPath => self
                .canonical()
                .map(|p| path::parent_path(&p))
                .unwrap_or_default(),
            FileName::LinkTarget => match fs::read_link(&self.name) {
                Ok(target) => {
                    let target = path::from_native_separators(&target.to_string_lossy());
                    let parent = path::parent_path(&self.absolute());
                    path::clean_path(&path::join(&parent, &target))
                }
                Err(_) => String::new(),
            },
        }
    }

    fn set_file_name(&mut self, name: &str) {
        if self.handle.is_some() {
            tracing::warn!(target: crate::engine::TARGET, path = %self.name, "cannot rename an open engine");
            return;
        }
        self.name = name.to_string();
    }

    #[cfg(unix)]
    fn owner_id(&self, owner: FileOwner) -> Option<u32> {
        use std::os::unix::fs::MetadataExt;
        let meta = fs::metadata(&self.name).ok()?;
        Some(match owner {
            FileOwner::User => meta.uid(),
            FileOwner::Group => meta.gid(),
        })
    }

    fn file_time(&self, time: FileTime) -> Option<SystemTime> {
        let meta = fs::metadata(&self.name).ok()?;
        match time {
            FileTime::Access => meta.accessed().ok(),
            FileTime::Birth => meta.created().ok(),
            FileTime::Modification => meta.modified().ok(),
            #[cfg(unix)]
            FileTime::MetadataChange => {
                use std::os::unix::fs::MetadataExt;
                let secs = u64::try_from(meta.ctime()).ok()?;
                let nanos = u32::try_from(meta.ctime_nsec()).ok()?;
                Some(SystemTime::UNIX_EPOCH + std::time::Duration::new(secs, nanos))
            }
            #[cfg(not(unix))]
            FileTime::MetadataChange => None,
        }
    }

    fn set_file_time(&mut self, time: SystemTime, which: FileTime) -> bool {
        let times = match which {
            FileTime::Access => fs::FileTimes::new().set_accessed(time),
            FileTime::Modification => fs::FileTimes::new().set_modified(time),
            FileTime::Birth | FileTime::MetadataChange => {
                return self.fail(VfsError::unsupported(&self.name, "set_file_time"));
            }
        };
        let result = match &self.handle {
            Some(handle) => handle.backing().set_times(times),
            None => File::open(&self.name).and_then(|file| file.set_times(times)),
        };
        self.outcome(result)
    }

    fn case_sensitive(&self) -> bool {
        cfg!(not(any(windows, target_os = "macos")))
    }

    fn id(&self) -> Option<String> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let meta = fs::metadata(&self.name).ok()?;
            Some(format!("{:x}:{:x}", meta.dev(), meta.ino()))
        }
        #[cfg(not(unix))]
        {
            self.canonical()
        }
    }

    fn error(&self) -> Option<&VfsError> {
        self.error.as_ref()
    }

    fn as_dir_iterable(&self) -> Option<&dyn DirIterable> {
        Some(self)
    }
}

impl DirIterable for NativeEngine {
    fn begin_entry_list(&self, _filters: DirFilters, _name_filters: &[String]) -> Option<EntryNames> {
        let entries = fs::read_dir(&self.name).ok()?;
        Some(Box::new(
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned()),
        ))
    }
}
