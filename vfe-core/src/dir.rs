//! Directory handles with filtered, sorted listings

use crate::engine::{failure, FileEngine};
use crate::error::{VfsError, VfsResult};
use crate::file_info::FileInfo;
use crate::flags::{DirFilters, FileFlags, FileName, IteratorFlags, SortFlags, SortKey};
use crate::iterator::DirIterator;
use crate::path;
use crate::resolver::EngineResolver;
use std::cmp::Ordering;

const TARGET: &str = "vfe::iterator";

/// A directory path plus the listing settings applied to it.
///
/// Nothing is checked on construction; a `Dir` may name a directory that
/// does not exist (yet).
#[derive(Debug, Clone)]
pub struct Dir {
    path: String,
    resolver: EngineResolver,
    name_filters: Vec<String>,
    filters: DirFilters,
    sort_key: SortKey,
    sort_flags: SortFlags,
}

impl Dir {
    pub fn new(path: &str) -> Self {
        Self::with_resolver(EngineResolver::global(), path)
    }

    pub fn with_resolver(resolver: EngineResolver, path: &str) -> Self {
        let path = if path.is_empty() { "." } else { path };
        Self {
            path: resolver.clean(path),
            resolver,
            name_filters: Vec::new(),
            filters: DirFilters::ALL_ENTRIES,
            sort_key: SortKey::Name,
            sort_flags: SortFlags::IGNORE_CASE,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = self.resolver.clean(path);
    }

    /// Last segment of the path
    pub fn dir_name(&self) -> &str {
        path::file_name(&self.path)
    }

    pub fn name_filters(&self) -> &[String] {
        &self.name_filters
    }

    pub fn set_name_filters<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.name_filters = patterns.into_iter().map(|p| p.as_ref().to_string()).collect();
    }

    pub fn filters(&self) -> DirFilters {
        self.filters
    }

    pub fn set_filters(&mut self, filters: DirFilters) {
        self.filters = filters;
    }

    pub fn sorting(&self) -> (SortKey, SortFlags) {
        (self.sort_key, self.sort_flags)
    }

    pub fn set_sorting(&mut self, key: SortKey, flags: SortFlags) {
        self.sort_key = key;
        self.sort_flags = flags;
    }

    fn engine(&self, path: &str) -> Box<dyn FileEngine> {
        self.resolver.create(path)
    }

    /// Path of `name` inside this directory (no normalization)
    pub fn file_path(&self, name: &str) -> String {
        path::join(&self.path, name)
    }

    pub fn absolute_path(&self) -> String {
        self.engine(&self.path).file_name(FileName::Absolute)
    }

    pub fn absolute_file_path(&self, name: &str) -> String {
        if path::is_absolute_path(name) {
            return name.to_string();
        }
        path::join(&self.absolute_path(), name)
    }

    /// Canonical path of the directory; empty when it does not exist
    pub fn canonical_path(&self) -> String {
        self.engine(&self.path).file_name(FileName::Canonical)
    }

    pub fn exists(&self) -> bool {
        let wanted = FileFlags::EXISTS | FileFlags::DIRECTORY_TYPE;
        self.engine(&self.path).file_flags(wanted) == wanted
    }

    /// Whether `name` (relative to this directory) exists
    pub fn contains(&self, name: &str) -> bool {
        !self
            .engine(&self.file_path(name))
            .file_flags(FileFlags::EXISTS)
            .is_empty()
    }

    pub fn is_root(&self) -> bool {
        !self.engine(&self.path).file_flags(FileFlags::ROOT).is_empty()
    }

    pub fn is_relative(&self) -> bool {
        path::is_relative_path(&self.path)
    }

    /// Enter `name`; fails unless it is an existing directory
    pub fn cd(&mut self, name: &str) -> VfsResult<()> {
        let target = self.resolver.clean(&self.file_path(name));
        let wanted = FileFlags::EXISTS | FileFlags::DIRECTORY_TYPE;
        if self.engine(&target).file_flags(wanted) != wanted {
            return Err(VfsError::not_found(&target));
        }
        tracing::trace!(target: TARGET, from = %self.path, to = %target, "cd");
        self.path = target;
        Ok(())
    }

    pub fn cd_up(&mut self) -> VfsResult<()> {
        if self.is_root() {
            return Err(VfsError::invalid_argument(&self.path, "already at the root"));
        }
        self.cd("..")
    }

    /// Entries in the directory, filtered and sorted by the current
    /// settings
    pub fn entry_info_list(&self) -> Vec<FileInfo> {
        self.entry_info_list_with(&self.name_filters, self.filters, self.sort_key, self.sort_flags)
    }

    pub fn entry_info_list_with(
        &self,
        name_filters: &[String],
        filters: DirFilters,
        key: SortKey,
        flags: SortFlags,
    ) -> Vec<FileInfo> {
        let iter = DirIterator::new(self.resolver.clone(), &self.path, filters, IteratorFlags::empty())
            .with_name_filters(name_filters);
        let mut entries: Vec<FileInfo> = iter.collect();
        sort_entries(&mut entries, key, flags);
        entries
    }

    /// Names of the entries, as [`entry_info_list`](Self::entry_info_list)
    pub fn entry_list(&self) -> Vec<String> {
        self.entry_info_list()
            .iter()
            .map(|info| info.file_name().to_string())
            .collect()
    }

    pub fn count(&self) -> usize {
        DirIterator::new(self.resolver.clone(), &self.path, self.filters, IteratorFlags::empty())
            .with_name_filters(&self.name_filters)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        let filters = self.filters | DirFilters::NO_DOT_AND_DOT_DOT;
        DirIterator::new(self.resolver.clone(), &self.path, filters, IteratorFlags::empty())
            .with_name_filters(&self.name_filters)
            .next()
            .is_none()
    }

    fn dir_op<F>(&self, name: &str, operation: &str, op: F) -> VfsResult<()>
    where
        F: FnOnce(&mut dyn FileEngine, &str) -> bool,
    {
        let target = self.resolver.clean(&self.file_path(name));
        let mut engine = self.engine(&target);
        if op(engine.as_mut(), &target) {
            Ok(())
        } else {
            Err(failure(engine.as_ref(), &target, operation))
        }
    }

    /// Create the directory `name`; its parent must exist
    pub fn mkdir(&self, name: &str) -> VfsResult<()> {
        self.dir_op(name, "mkdir", |engine, target| engine.mkdir(target, false))
    }

    /// Create `name` and every missing parent
    pub fn mkpath(&self, name: &str) -> VfsResult<()> {
        self.dir_op(name, "mkpath", |engine, target| engine.mkdir(target, true))
    }

    /// Remove the empty directory `name`
    pub fn rmdir(&self, name: &str) -> VfsResult<()> {
        self.dir_op(name, "rmdir", |engine, target| engine.rmdir(target, false))
    }

    /// Remove `name`, then every parent that became empty
    pub fn rmpath(&self, name: &str) -> VfsResult<()> {
        self.dir_op(name, "rmpath", |engine, target| engine.rmdir(target, true))
    }

    /// Remove the file `name`
    pub fn remove(&self, name: &str) -> VfsResult<()> {
        self.dir_op(name, "remove", |engine, _| engine.remove())
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> VfsResult<()> {
        let destination = self.resolver.clean(&self.file_path(new_name));
        self.dir_op(old_name, "rename", |engine, _| engine.rename(&destination))
    }
}

fn compare_names(a: &str, b: &str, ignore_case: bool) -> Ordering {
    if ignore_case {
        a.to_lowercase().cmp(&b.to_lowercase())
    } else {
        a.cmp(b)
    }
}

fn compare_entries(a: &FileInfo, b: &FileInfo, key: SortKey, flags: SortFlags) -> Ordering {
    if flags.intersects(SortFlags::DIRS_FIRST | SortFlags::DIRS_LAST) && a.is_dir() != b.is_dir() {
        let dirs_first = if a.is_dir() { Ordering::Less } else { Ordering::Greater };
        return if flags.contains(SortFlags::DIRS_FIRST) {
            dirs_first
        } else {
            dirs_first.reverse()
        };
    }

    let ignore_case = flags.contains(SortFlags::IGNORE_CASE);
    let ordering = match key {
        // newest first
        SortKey::Time => b.last_modified().cmp(&a.last_modified()),
        // largest first
        SortKey::Size => b.size().cmp(&a.size()),
        SortKey::Type => compare_names(a.suffix(), b.suffix(), ignore_case),
        SortKey::Name | SortKey::Unsorted => Ordering::Equal,
    };
    let ordering = if key == SortKey::Unsorted {
        ordering
    } else {
        ordering.then_with(|| compare_names(a.file_name(), b.file_name(), ignore_case))
    };

    if flags.contains(SortFlags::REVERSED) {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Stable sort of `entries`. `Unsorted` keeps backend order unless
/// directories are to be grouped.
pub fn sort_entries(entries: &mut [FileInfo], key: SortKey, flags: SortFlags) {
    if key == SortKey::Unsorted && !flags.intersects(SortFlags::DIRS_FIRST | SortFlags::DIRS_LAST) {
        return;
    }
    entries.sort_by(|a, b| compare_entries(a, b, key, flags));
}
