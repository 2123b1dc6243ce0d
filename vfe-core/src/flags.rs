//! Flag sets and selector enums shared by engines, iterators and listings

use bitflags::bitflags;

bitflags! {
    /// How a file is opened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpenMode: u32 {
        const READ = 0x0001;
        const WRITE = 0x0002;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        /// Cursor starts at the end; implies write
        const APPEND = 0x0004;
        const TRUNCATE = 0x0008;
        const UNBUFFERED = 0x0020;
        /// Fail if the file already exists
        const NEW_ONLY = 0x0040;
        /// Fail if the file does not exist
        const EXISTING_ONLY = 0x0080;
    }
}

impl OpenMode {
    /// Whether the mode allows writing at all
    pub fn is_writable(self) -> bool {
        self.intersects(Self::WRITE | Self::APPEND)
    }

    /// Whether opening discards the current content
    pub fn truncates(self) -> bool {
        self.contains(Self::TRUNCATE)
            || (self.is_writable() && !self.intersects(Self::READ | Self::APPEND))
    }
}

bitflags! {
    /// Permission, type and attribute bits of an entry.
    ///
    /// `file_flags(mask)` answers with the intersection of what the engine
    /// knows and `mask`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileFlags: u32 {
        const READ_OWNER = 0x4000;
        const WRITE_OWNER = 0x2000;
        const EXE_OWNER = 0x1000;
        const READ_USER = 0x0400;
        const WRITE_USER = 0x0200;
        const EXE_USER = 0x0100;
        const READ_GROUP = 0x0040;
        const WRITE_GROUP = 0x0020;
        const EXE_GROUP = 0x0010;
        const READ_OTHER = 0x0004;
        const WRITE_OTHER = 0x0002;
        const EXE_OTHER = 0x0001;

        const LINK_TYPE = 0x0001_0000;
        const FILE_TYPE = 0x0002_0000;
        const DIRECTORY_TYPE = 0x0004_0000;
        const BUNDLE_TYPE = 0x0008_0000;

        const HIDDEN = 0x0010_0000;
        const LOCAL_DISK = 0x0020_0000;
        const EXISTS = 0x0040_0000;
        const ROOT = 0x0080_0000;
        /// Ask the engine to drop cached metadata before answering
        const REFRESH = 0x0100_0000;

        const PERMS_MASK = 0x0000_FFFF;
        const TYPES_MASK = 0x000F_0000;
        const FLAGS_MASK = 0x0FF0_0000;
    }
}

impl FileFlags {
    /// Every permission, type and attribute bit
    pub fn everything() -> Self {
        Self::PERMS_MASK | Self::TYPES_MASK | Self::FLAGS_MASK
    }

    /// Flags from POSIX mode bits (`rwxrwxrwx`). Owner and user share the
    /// `u` triplet.
    pub fn from_mode(mode: u32) -> Self {
        let mut flags = FileFlags::empty();
        let bits = [
            (0o400, Self::READ_OWNER | Self::READ_USER),
            (0o200, Self::WRITE_OWNER | Self::WRITE_USER),
            (0o100, Self::EXE_OWNER | Self::EXE_USER),
            (0o040, Self::READ_GROUP),
            (0o020, Self::WRITE_GROUP),
            (0o010, Self::EXE_GROUP),
            (0o004, Self::READ_OTHER),
            (0o002, Self::WRITE_OTHER),
            (0o001, Self::EXE_OTHER),
        ];
        for (bit, flag) in bits {
            if mode & bit != 0 {
                flags |= flag;
            }
        }
        flags
    }

    /// POSIX mode bits for the permission part of `self`
    pub fn to_mode(self) -> u32 {
        let mut mode = 0;
        let bits = [
            (Self::READ_OWNER, 0o400),
            (Self::WRITE_OWNER, 0o200),
            (Self::EXE_OWNER, 0o100),
            (Self::READ_GROUP, 0o040),
            (Self::WRITE_GROUP, 0o020),
            (Self::EXE_GROUP, 0o010),
            (Self::READ_OTHER, 0o004),
            (Self::WRITE_OTHER, 0o002),
            (Self::EXE_OTHER, 0o001),
        ];
        for (flag, bit) in bits {
            if self.contains(flag) {
                mode |= bit;
            }
        }
        mode
    }

    pub fn permissions(self) -> Self {
        self & Self::PERMS_MASK
    }
}

/// Which name of an entry `file_name` should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileName {
    /// The path as the engine was created with
    #[default]
    Default,
    /// Last path segment
    Base,
    /// Everything before the last segment
    Path,
    Absolute,
    AbsolutePath,
    /// Absolute with links and `..` resolved; empty if the entry is missing
    Canonical,
    CanonicalPath,
    /// Target of a symbolic link; empty for anything else
    LinkTarget,
}

/// Owner selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOwner {
    User,
    Group,
}

/// Timestamp selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileTime {
    Access,
    Birth,
    MetadataChange,
    Modification,
}

bitflags! {
    /// Which entries a listing admits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirFilters: u32 {
        const DIRS = 0x0001;
        const FILES = 0x0002;
        const DRIVES = 0x0004;
        const NO_SYMLINKS = 0x0008;
        const ALL_ENTRIES = Self::DIRS.bits() | Self::FILES.bits() | Self::DRIVES.bits();

        const READABLE = 0x0010;
        const WRITABLE = 0x0020;
        const EXECUTABLE = 0x0040;
        const PERMISSION_MASK = 0x0070;

        const MODIFIED = 0x0080;
        const HIDDEN = 0x0100;
        const SYSTEM = 0x0200;

        /// Directories are listed regardless of name filters
        const ALL_DIRS = 0x0400;
        const CASE_SENSITIVE = 0x0800;
        const NO_DOT = 0x2000;
        const NO_DOT_DOT = 0x4000;
        const NO_DOT_AND_DOT_DOT = Self::NO_DOT.bits() | Self::NO_DOT_DOT.bits();
    }
}

impl Default for DirFilters {
    fn default() -> Self {
        Self::ALL_ENTRIES
    }
}

bitflags! {
    /// Traversal options of a [`DirIterator`](crate::DirIterator).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IteratorFlags: u32 {
        const SUBDIRECTORIES = 0x1;
        const FOLLOW_SYMLINKS = 0x2;
    }
}

/// Primary sort key of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Name,
    Time,
    Size,
    Type,
    Unsorted,
}

bitflags! {
    /// Modifiers applied on top of a [`SortKey`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SortFlags: u32 {
        const DIRS_FIRST = 0x04;
        const REVERSED = 0x08;
        const IGNORE_CASE = 0x10;
        const DIRS_LAST = 0x20;
        const LOCALE_AWARE = 0x40;
    }
}
