//! Template discovery over a [`FileTree`].
//!
//! This module provides [`TemplateWalker`], which traverses a file tree with
//! an explicit work stack of pending directories and collects every file
//! whose extension matches the configured template extension.
//!
//! # Ordering
//!
//! Entries of each directory are sorted by name (byte-wise), files of a
//! directory are yielded before its subdirectories are entered, and
//! subdirectories are visited depth-first in name order. The result depends
//! only on the tree's content, never on listing order.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use tmpl_core::{normalize_extension, DEFAULT_TEMPLATE_EXTENSION};
use tracing::debug;

use crate::file_tree::{FileEntry, FileTree};

/// A discovered template: an entry handle and its path relative to the root.
pub struct RelativeFileInfo {
    entry: Box<dyn FileEntry>,
    relative_path: String,
}

impl RelativeFileInfo {
    /// Pairs an entry with its relative path.
    #[must_use]
    pub fn new(entry: Box<dyn FileEntry>, relative_path: impl Into<String>) -> Self {
        Self {
            entry,
            relative_path: relative_path.into(),
        }
    }

    /// The file-tree entry.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> &dyn FileEntry {
        self.entry.as_ref()
    }

    /// The `/`-separated path relative to the tree root.
    #[inline]
    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// The path diagnostics should point at.
    ///
    /// Prefers the entry's location on disk and falls back to the relative
    /// path for trees without physical backing.
    #[must_use]
    pub fn diagnostic_path(&self) -> Utf8PathBuf {
        self.entry
            .physical_path()
            .map_or_else(|| Utf8PathBuf::from(&self.relative_path), Utf8Path::to_owned)
    }
}

impl fmt::Debug for RelativeFileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelativeFileInfo")
            .field("relative_path", &self.relative_path)
            .field("length", &self.entry.length())
            .finish_non_exhaustive()
    }
}

/// Collects template files from a [`FileTree`].
///
/// # Examples
///
/// ```
/// use tmpl_compiler::{MemoryFileTree, TemplateWalker};
///
/// let tree = MemoryFileTree::new()
///     .with_file("views/home/index.TMPL", "a")
///     .with_file("views/layout.tmpl", "b")
///     .with_file("notes.txt", "c");
///
/// let walker = TemplateWalker::new(".tmpl");
/// let paths: Vec<_> = walker
///     .collect(&tree)
///     .iter()
///     .map(|file| file.relative_path().to_owned())
///     .collect();
///
/// assert_eq!(paths, ["views/layout.tmpl", "views/home/index.TMPL"]);
/// ```
#[derive(Debug, Clone)]
pub struct TemplateWalker {
    /// Extension without the leading dot, lowercased.
    extension: String,
}

impl Default for TemplateWalker {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_EXTENSION)
    }
}

impl TemplateWalker {
    /// Creates a walker matching `extension`, with or without a leading dot.
    ///
    /// Matching is case-insensitive.
    #[must_use]
    pub fn new(extension: &str) -> Self {
        Self {
            extension: normalize_extension(extension),
        }
    }

    /// The extension being matched, without the leading dot.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns `true` if a file called `name` is a template.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        Utf8Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Collects every template in `tree`, in traversal order.
    ///
    /// Directories that cannot be listed are treated as empty.
    pub fn collect(&self, tree: &dyn FileTree) -> Vec<RelativeFileInfo> {
        let mut files = Vec::new();
        let mut pending = vec![String::new()];

        while let Some(directory) = pending.pop() {
            let Some(mut entries) = tree.list_directory(&directory) else {
                debug!(directory = %directory, "Directory not listable, skipping");
                continue;
            };
            entries.sort_by(|a, b| a.name().cmp(b.name()));

            let mut subdirectories = Vec::new();
            for entry in entries {
                let relative_path = join(&directory, entry.name());
                if entry.is_directory() {
                    subdirectories.push(relative_path);
                } else if self.matches(entry.name()) {
                    files.push(RelativeFileInfo::new(entry, relative_path));
                }
            }

            // Reversed so the first subdirectory is popped next.
            pending.extend(subdirectories.into_iter().rev());
        }

        debug!(count = files.len(), extension = %self.extension, "Collected templates");
        files
    }
}

fn join(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_owned()
    } else {
        format!("{directory}/{name}")
    }
}
