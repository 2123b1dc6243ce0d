//! Path normalization
//!
//! Pure string transformations used to turn whatever a caller passed in
//! into the canonical key engines and the resolver work with. Nothing here
//! touches a file system.

use bitflags::bitflags;
use vfe_config::PathConfig;

/// Marker that starts a path in the resource namespace (`:/images/a.png`)
pub const RESOURCE_PREFIX: char = ':';

const TARGET: &str = "vfe::path";

bitflags! {
    /// Syntax switches for [`clean_path_with`] and friends.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CleanFlags: u8 {
        /// `//host/share` keeps `//host` as its root
        const UNC_PATHS = 0x1;
        /// `C:` / `C:/` prefixes are roots distinct from `/`
        const DRIVE_LETTERS = 0x2;
        /// `\` is a separator and gets rewritten to `/`
        const BACKSLASH_SEPARATORS = 0x4;
    }
}

impl CleanFlags {
    /// Path syntax of the host platform
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::all()
        } else {
            Self::empty()
        }
    }

    /// Platform defaults overridden by whatever the configuration pins down
    pub fn from_config(cfg: &PathConfig) -> Self {
        let mut flags = Self::native();
        if let Some(on) = cfg.unc_paths {
            flags.set(Self::UNC_PATHS, on);
        }
        if let Some(on) = cfg.drive_letters {
            flags.set(Self::DRIVE_LETTERS, on);
        }
        if let Some(on) = cfg.backslash_separators {
            flags.set(Self::BACKSLASH_SEPARATORS, on);
        }
        flags
    }
}

impl Default for CleanFlags {
    fn default() -> Self {
        Self::native()
    }
}

/// Root prefix of a path, split off before segment processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root<'a> {
    /// Relative path
    None,
    /// `/`
    Slash,
    /// `:` or `:/`
    Resource(&'a str),
    /// `C:` (drive relative) or `C:/`
    Drive(&'a str, bool),
    /// `//host`
    Unc(&'a str),
}

impl Root<'_> {
    fn is_rooted(&self) -> bool {
        match self {
            Root::None => false,
            Root::Drive(_, slash) => *slash,
            _ => true,
        }
    }
}

fn split_root(name: &str, flags: CleanFlags) -> (Root<'_>, &str) {
    let bytes = name.as_bytes();

    if bytes.first() == Some(&(RESOURCE_PREFIX as u8)) {
        return if bytes.get(1) == Some(&b'/') {
            (Root::Resource(&name[..2]), &name[2..])
        } else {
            (Root::Resource(&name[..1]), &name[1..])
        };
    }

    if flags.contains(CleanFlags::DRIVE_LETTERS)
        && bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
    {
        return if bytes.get(2) == Some(&b'/') {
            (Root::Drive(&name[..2], true), &name[3..])
        } else {
            (Root::Drive(&name[..2], false), &name[2..])
        };
    }

    if flags.contains(CleanFlags::UNC_PATHS)
        && name.starts_with("//")
        && bytes.get(2).is_some_and(|b| *b != b'/')
    {
        let host_end = name[2..].find('/').map(|i| i + 2).unwrap_or(name.len());
        return (Root::Unc(&name[..host_end]), &name[host_end..]);
    }

    if let Some(rest) = name.strip_prefix('/') {
        return (Root::Slash, rest);
    }

    (Root::None, name)
}

/// Canonicalize `path` using the host platform's syntax.
///
/// See [`clean_path_with`].
pub fn clean_path(path: &str) -> String {
    clean_path_with(path, CleanFlags::native())
}

/// Canonicalize a path string.
///
/// * repeated separators collapse to one, `.` segments disappear;
/// * `..` removes the segment before it; leading `..` of a relative path
///   stay (`"../.."`);
/// * a `..` that would climb above the root leaves the input untouched
///   (`"/.."` and `"/../"` come back as they went in);
/// * an empty result becomes `"."`, trailing separators go except on roots.
///
/// ```
/// use vfe_core::path::{clean_path_with, CleanFlags};
///
/// let posix = CleanFlags::empty();
/// assert_eq!(clean_path_with("/usr//lib/./../bin/", posix), "/usr/bin");
/// assert_eq!(clean_path_with("foo/..", posix), ".");
/// assert_eq!(clean_path_with("/..", posix), "/..");
/// ```
pub fn clean_path_with(path: &str, flags: CleanFlags) -> String {
    if path.is_empty() {
        return String::new();
    }

    let name = from_separators(path, flags);
    let (root, rest) = split_root(&name, flags);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if root.is_rooted() => {
                    tracing::trace!(target: TARGET, path = %name, "'..' above root, path kept as is");
                    return name;
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match root {
        Root::None if joined.is_empty() => String::from("."),
        Root::None => joined,
        Root::Slash => format!("/{joined}"),
        Root::Resource(prefix) => format!("{prefix}{joined}"),
        Root::Drive(drive, true) => format!("{drive}/{joined}"),
        Root::Drive(drive, false) => format!("{drive}{joined}"),
        Root::Unc(host) if joined.is_empty() => host.to_string(),
        Root::Unc(host) => format!("{host}/{joined}"),
    }
}

fn from_separators(path: &str, flags: CleanFlags) -> String {
    if flags.contains(CleanFlags::BACKSLASH_SEPARATORS) {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

/// Rewrite native separators to `/` (a no-op off Windows)
pub fn from_native_separators(path: &str) -> String {
    from_separators(path, CleanFlags::native())
}

/// Rewrite `/` to the native separator (a no-op off Windows)
pub fn to_native_separators(path: &str) -> String {
    if cfg!(windows) {
        path.replace('/', "\\")
    } else {
        path.to_string()
    }
}

/// Whether `path` is absolute under the given syntax.
///
/// Resource paths are always absolute even though they carry no drive or
/// leading separator.
pub fn is_absolute_path_with(path: &str, flags: CleanFlags) -> bool {
    let bytes = path.as_bytes();
    match bytes.first() {
        None => false,
        Some(b'/') => true,
        Some(b':') => true,
        Some(b'\\') => flags.contains(CleanFlags::BACKSLASH_SEPARATORS),
        Some(first) => {
            flags.contains(CleanFlags::DRIVE_LETTERS)
                && first.is_ascii_alphabetic()
                && bytes.get(1) == Some(&b':')
                && matches!(bytes.get(2), Some(b'/') | Some(b'\\'))
        }
    }
}

pub fn is_absolute_path(path: &str) -> bool {
    is_absolute_path_with(path, CleanFlags::native())
}

pub fn is_relative_path(path: &str) -> bool {
    !is_absolute_path(path)
}

/// Whether `path` belongs to the resource namespace
pub fn is_resource_path(path: &str) -> bool {
    path.starts_with(RESOURCE_PREFIX)
}

/// Append `name` to `dir`; an absolute `name` replaces `dir`
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() || is_absolute_path(name) {
        return name.to_string();
    }
    if name.is_empty() {
        return dir.to_string();
    }
    if dir.ends_with('/') || dir == ":" {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Last segment of `path` (`""` for a bare root)
pub fn file_name(path: &str) -> &str {
    let trimmed = path.strip_prefix(RESOURCE_PREFIX).unwrap_or(path);
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Directory part of `path`: `"/a/b"` → `"/a"`, `"/a"` → `"/"`, `"a"` → `"."`
pub fn parent_path(path: &str) -> String {
    let (root_len, plain) = match path.as_bytes() {
        [b':', b'/', ..] => (2, false),
        [b':', ..] => (1, false),
        [b'/', ..] => (1, false),
        _ => (0, true),
    };
    match path.rfind('/') {
        Some(idx) if idx < root_len => path[..root_len].to_string(),
        Some(0) => String::from("/"),
        Some(idx) => path[..idx].to_string(),
        None if plain => String::from("."),
        None => path[..root_len].to_string(),
    }
}

/// Suffix after the last dot of the file name (`"tar"` for `"a.b.tar"`)
pub fn suffix(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => "",
    }
}

/// Suffix after the first dot of the file name (`"b.tar"` for `"a.b.tar"`)
pub fn complete_suffix(path: &str) -> &str {
    let name = file_name(path);
    match name.find('.') {
        Some(idx) => &name[idx + 1..],
        None => "",
    }
}

/// File name up to the first dot
pub fn base_name(path: &str) -> &str {
    let name = file_name(path);
    match name.find('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posix(p: &str) -> String {
        clean_path_with(p, CleanFlags::empty())
    }

    fn windows(p: &str) -> String {
        clean_path_with(p, CleanFlags::all())
    }

    #[test]
    fn test_collapse_separators_and_dots() {
        assert_eq!(posix("/Users/sam/troll/qt4.0//.."), "/Users/sam/troll");
        assert_eq!(posix("/Users/sam////troll/qt4.0//.."), "/Users/sam/troll");
        assert_eq!(posix(".//file1.txt"), "file1.txt");
        assert_eq!(posix("/foo/bar/..//file1.txt"), "/foo/file1.txt");
        assert_eq!(posix("ab/a/"), "ab/a");
        assert_eq!(posix("/path/.."), "/");
    }

    #[test]
    fn test_roots() {
        assert_eq!(posix("/"), "/");
        assert_eq!(posix("//"), "/");
        assert_eq!(posix("/."), "/");
        assert_eq!(posix("/./"), "/");
        assert_eq!(posix(""), "");
    }

    #[test]
    fn test_above_root_kept_literally() {
        assert_eq!(posix("/.."), "/..");
        assert_eq!(posix("/../"), "/../");
        assert_eq!(posix("/a/../../b"), "/a/../../b");
    }

    #[test]
    fn test_dot_collapse() {
        assert_eq!(posix("foo/.."), ".");
        assert_eq!(posix("foo/../"), ".");
        assert_eq!(posix("./foo/.."), ".");
        assert_eq!(posix("."), ".");
    }

    #[test]
    fn test_leading_dot_dot_preserved() {
        assert_eq!(posix("../."), "..");
        assert_eq!(posix("../.."), "../..");
        assert_eq!(posix("a/../../b"), "../b");
        assert_eq!(posix("d:\\a\\bc\\def\\../../.."), "..");
    }

    #[test]
    fn test_url_like_paths() {
        assert_eq!(posix("http://foo/../bar"), "http:/bar");
        assert_eq!(posix("ssh://host/./prefix/../foo.bar"), "ssh:/host/foo.bar");
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(posix(":/prefix/foo.bar"), ":/prefix/foo.bar");
        assert_eq!(posix(":/prefix/..//prefix/foo.bar"), ":/prefix/foo.bar");
        assert_eq!(posix(":/.."), ":/..");
        assert_eq!(posix(":/"), ":/");
    }

    #[test]
    fn test_unc_flag() {
        assert_eq!(windows("//foo//bar"), "//foo/bar");
        assert_eq!(posix("//foo//bar"), "/foo/bar");
        assert_eq!(windows("//server/path/.."), "//server");
        assert_eq!(windows("//server/.."), "//server/..");
        assert_eq!(posix("//server/.."), "/");
        assert_eq!(windows("//c:/foo"), "//c:/foo");
        assert_eq!(posix("//c:/foo"), "/c:/foo");
    }

    #[test]
    fn test_drive_letter_flag() {
        assert_eq!(windows("c:\\"), "c:/");
        assert_eq!(windows("c://"), "c:/");
        assert_eq!(windows("c://foo"), "c:/foo");
        assert_eq!(windows("d:\\a\\bc\\def\\.."), "d:/a/bc");
        assert_eq!(windows("A:/path/.."), "A:/");
        assert_eq!(windows("A:/.."), "A:/..");
        assert_eq!(posix("A:/path/.."), "A:");
        assert_eq!(posix("A:/.."), ".");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "/a/b/../c", "a//b/./c/", "../../x", "/..", "/../", "foo/..",
            ":/res/../x", "//h/s/../t", "C:/x/../y", "",
        ];
        for flags in [CleanFlags::empty(), CleanFlags::all()] {
            for input in inputs {
                let once = clean_path_with(input, flags);
                assert_eq!(clean_path_with(&once, flags), once, "input {input:?}");
            }
        }
    }

    #[test]
    fn test_canonical_input_unchanged() {
        for p in ["/", "/a/b", "a/b", "..", "../a", ":/x/y", "."] {
            assert_eq!(posix(p), p);
        }
    }

    #[test]
    fn test_relative_and_absolute() {
        assert!(!is_relative_path(":/prefix/foo"));
        assert!(!is_relative_path(":foo"));
        assert!(!is_relative_path("/usr"));
        assert!(is_relative_path("usr/lib"));
        assert!(is_relative_path(""));
        assert!(is_absolute_path_with("C:/x", CleanFlags::all()));
        assert!(!is_absolute_path_with("C:x", CleanFlags::all()));
        assert!(!is_absolute_path_with("C:/x", CleanFlags::empty()));
        assert!(is_resource_path(":/a"));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/a", "b"), "/a/b");
        assert_eq!(join("/", "b"), "/b");
        assert_eq!(join(":/", "b"), ":/b");
        assert_eq!(join("/a", "/b"), "/b");
        assert_eq!(join("", "b"), "b");
        assert_eq!(join("/a", ""), "/a");
    }

    #[test]
    fn test_name_parts() {
        assert_eq!(file_name("/a/b.tar.gz"), "b.tar.gz");
        assert_eq!(file_name("/"), "");
        assert_eq!(file_name(":/img.png"), "img.png");
        assert_eq!(suffix("/a/b.tar.gz"), "gz");
        assert_eq!(complete_suffix("/a/b.tar.gz"), "tar.gz");
        assert_eq!(base_name("/a/b.tar.gz"), "b");
        assert_eq!(suffix("/a/README"), "");
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/a/b"), "/a");
        assert_eq!(parent_path("/a"), "/");
        assert_eq!(parent_path("/"), "/");
        assert_eq!(parent_path("a"), ".");
        assert_eq!(parent_path("a/b"), "a");
        assert_eq!(parent_path(":/a"), ":/");
        assert_eq!(parent_path(":/a/b"), ":/a");
    }

    #[test]
    fn test_from_config() {
        let cfg = PathConfig {
            unc_paths: Some(true),
            drive_letters: Some(false),
            backslash_separators: None,
        };
        let flags = CleanFlags::from_config(&cfg);
        assert!(flags.contains(CleanFlags::UNC_PATHS));
        assert!(!flags.contains(CleanFlags::DRIVE_LETTERS));
    }
}
