//! Directory traversal
//!
//! [`DirIterator`] walks the children of one directory, or the whole tree
//! below it with [`IteratorFlags::SUBDIRECTORIES`]. Listing goes through
//! whatever engine the resolver binds to each directory, so memory stores,
//! archives and resources traverse exactly like the disk.
//!
//! Recursion is pre-order and depth first. With
//! [`IteratorFlags::FOLLOW_SYMLINKS`] every descended directory is
//! remembered by canonical path and never entered twice, which keeps link
//! cycles finite.

use crate::engine::EntryNames;
use crate::file_info::FileInfo;
use crate::flags::{DirFilters, FileName, IteratorFlags};
use crate::glob::NameFilters;
use crate::resolver::EngineResolver;
use std::collections::HashSet;
use vfe_config::IterationConfig;

const TARGET: &str = "vfe::iterator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Positioned,
    Exhausted,
}

/// One directory being listed
struct Frame {
    dir: String,
    depth: usize,
    names: EntryNames,
}

/// Pull-based directory iterator.
///
/// `advance` moves to the next entry that passes the filters; once it
/// returns `false` the iterator stays exhausted.
pub struct DirIterator {
    resolver: EngineResolver,
    root: String,
    filters: DirFilters,
    flags: IteratorFlags,
    patterns: Vec<String>,
    name_filters: NameFilters,
    max_depth: Option<usize>,
    state: State,
    stack: Vec<Frame>,
    visited: HashSet<String>,
    current: Option<FileInfo>,
}

impl DirIterator {
    pub fn new(resolver: EngineResolver, path: &str, filters: DirFilters, flags: IteratorFlags) -> Self {
        let filters = if filters.is_empty() {
            DirFilters::ALL_ENTRIES
        } else {
            filters
        };
        Self {
            resolver,
            root: path.to_string(),
            filters,
            flags,
            patterns: Vec::new(),
            name_filters: NameFilters::default(),
            max_depth: None,
            state: State::Idle,
            stack: Vec::new(),
            visited: HashSet::new(),
            current: None,
        }
    }

    /// Recursive iterator configured from `cfg`
    pub fn from_config(resolver: EngineResolver, path: &str, filters: DirFilters, cfg: &IterationConfig) -> Self {
        let mut flags = IteratorFlags::SUBDIRECTORIES;
        if cfg.follow_symlinks {
            flags |= IteratorFlags::FOLLOW_SYMLINKS;
        }
        Self::new(resolver, path, filters, flags).with_max_depth(cfg.max_depth)
    }

    /// Only yield entries whose names match one of `patterns`
    pub fn with_name_filters<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.patterns = patterns.into_iter().map(|p| p.as_ref().to_string()).collect();
        self.name_filters = NameFilters::new(&self.patterns, self.filters.contains(DirFilters::CASE_SENSITIVE));
        self
    }

    /// Deepest directory level descended into; `Some(0)` lists the root only
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Directory the iteration started from
    pub fn path(&self) -> &str {
        &self.root
    }

    /// Entry the iterator is positioned on
    pub fn current(&self) -> Option<&FileInfo> {
        self.current.as_ref()
    }

    pub fn file_path(&self) -> Option<&str> {
        self.current.as_ref().map(FileInfo::file_path)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.current.as_ref().map(FileInfo::file_name)
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Move to the next accepted entry. `false` once everything has been
    /// visited, and on every call after that.
    pub fn advance(&mut self) -> bool {
        match self.state {
            State::Exhausted => return false,
            State::Idle => self.start(),
            State::Positioned => {}
        }

        loop {
            let Some(frame) = self.stack.last_mut() else {
                self.finish();
                return false;
            };
            let Some(name) = frame.names.next() else {
                tracing::trace!(target: TARGET, dir = %frame.dir, "directory done");
                self.stack.pop();
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let (dir, depth) = (frame.dir.clone(), frame.depth);
            let info = FileInfo::in_dir(self.resolver.clone(), &dir, &name);
            self.check_and_push_directory(&info, depth);
            if self.matches_filters(&name, &info) {
                self.current = Some(info);
                self.state = State::Positioned;
                return true;
            }
        }
    }

    fn start(&mut self) {
        tracing::debug!(
            target: TARGET,
            root = %self.root,
            filters = ?self.filters,
            flags = ?self.flags,
            "iteration started"
        );
        if self.flags.contains(IteratorFlags::FOLLOW_SYMLINKS) {
            let canonical = self.resolver.create(&self.root).file_name(FileName::Canonical);
            if !canonical.is_empty() {
                self.visited.insert(canonical);
            }
        }
        let root = self.root.clone();
        if !self.push_directory(&root, 0) {
            tracing::debug!(target: TARGET, root = %self.root, "root cannot be listed");
        }
    }

    fn finish(&mut self) {
        if self.state != State::Exhausted {
            tracing::debug!(target: TARGET, root = %self.root, "iteration exhausted");
        }
        self.state = State::Exhausted;
        self.current = None;
        self.stack.clear();
    }

    fn push_directory(&mut self, dir: &str, depth: usize) -> bool {
        let engine = self.resolver.create(dir);
        let Some(listing) = engine
            .as_dir_iterable()
            .and_then(|d| d.begin_entry_list(self.filters, &self.patterns))
        else {
            return false;
        };

        let mut dots = Vec::new();
        if !self.filters.contains(DirFilters::NO_DOT) {
            dots.push(String::from("."));
        }
        if !self.filters.contains(DirFilters::NO_DOT_DOT) {
            dots.push(String::from(".."));
        }
        let names: EntryNames = if dots.is_empty() {
            listing
        } else {
            Box::new(dots.into_iter().chain(listing))
        };

        tracing::trace!(target: TARGET, dir, depth, "descending");
        self.stack.push(Frame {
            dir: dir.to_string(),
            depth,
            names,
        });
        true
    }

    fn check_and_push_directory(&mut self, info: &FileInfo, depth: usize) {
        if !self.flags.contains(IteratorFlags::SUBDIRECTORIES) {
            return;
        }
        let name = info.file_name();
        if name == "." || name == ".." {
            return;
        }
        if !info.is_dir() {
            return;
        }
        let follow = self.flags.contains(IteratorFlags::FOLLOW_SYMLINKS);
        if !follow && info.is_symlink() {
            return;
        }
        if !self.filters.intersects(DirFilters::HIDDEN | DirFilters::ALL_DIRS) && info.is_hidden() {
            return;
        }
        let child_depth = depth + 1;
        if self.max_depth.is_some_and(|max| child_depth > max) {
            return;
        }
        if follow {
            let canonical = info.canonical_file_path();
            if canonical.is_empty() || !self.visited.insert(canonical.to_string()) {
                tracing::debug!(target: TARGET, path = %info.file_path(), "already visited, not descending");
                return;
            }
        }
        self.push_directory(info.file_path(), child_depth);
    }

    fn matches_filters(&self, name: &str, info: &FileInfo) -> bool {
        let filters = self.filters;
        let dot_or_dot_dot = name == "." || name == "..";

        if !self.name_filters.is_empty()
            && !(filters.contains(DirFilters::ALL_DIRS) && info.is_dir())
            && !self.name_filters.matches(name)
        {
            return false;
        }

        let include_system = filters.contains(DirFilters::SYSTEM);
        // a broken link survives only as a "system" entry
        if filters.contains(DirFilters::NO_SYMLINKS) && info.is_symlink() && (!include_system || info.exists()) {
            return false;
        }

        if !filters.contains(DirFilters::HIDDEN) && !dot_or_dot_dot && info.is_hidden() {
            return false;
        }

        if !include_system
            && (!(info.is_file() || info.is_dir() || info.is_symlink()) || (info.is_symlink() && !info.exists()))
        {
            return false;
        }

        if !filters.intersects(DirFilters::DIRS | DirFilters::ALL_DIRS) && info.is_dir() {
            return false;
        }
        if !filters.contains(DirFilters::FILES) && info.is_file() {
            return false;
        }

        let perms = filters & DirFilters::PERMISSION_MASK;
        if !perms.is_empty() && perms != DirFilters::PERMISSION_MASK {
            if (perms.contains(DirFilters::READABLE) && !info.is_readable())
                || (perms.contains(DirFilters::WRITABLE) && !info.is_writable())
                || (perms.contains(DirFilters::EXECUTABLE) && !info.is_executable())
            {
                return false;
            }
        }

        if dot_or_dot_dot {
            if name == "." && filters.contains(DirFilters::NO_DOT) {
                return false;
            }
            if name == ".." && filters.contains(DirFilters::NO_DOT_DOT) {
                return false;
            }
        }
        true
    }
}

impl Iterator for DirIterator {
    type Item = FileInfo;

    fn next(&mut self) -> Option<FileInfo> {
        if self.advance() {
            self.current.clone()
        } else {
            None
        }
    }
}

impl std::iter::FusedIterator for DirIterator {}

impl std::fmt::Debug for DirIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirIterator")
            .field("root", &self.root)
            .field("filters", &self.filters)
            .field("flags", &self.flags)
            .field("state", &self.state)
            .field("depth", &self.stack.len())
            .finish()
    }
}
