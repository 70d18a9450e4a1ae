//! Read-only hierarchical file stores.
//!
//! The pipeline never touches the filesystem directly. It walks a
//! [`FileTree`], which lists directories by their `/`-separated path relative
//! to the tree root (`""` is the root itself) and hands out [`FileEntry`]
//! handles that can be opened for reading any number of times.
//!
//! Two implementations ship with the crate:
//!
//! - [`PhysicalFileTree`]: a directory on disk, honouring `.gitignore` rules
//!   and a set of skipped directory names
//! - [`MemoryFileTree`]: an in-memory tree for tests and embedding

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use rustc_hash::FxHashSet;
use tmpl_core::{BuildConfig, ConfigError};
use tracing::{debug, warn};

/// One entry of a directory listing.
pub trait FileEntry: fmt::Debug + Send + Sync {
    /// The entry's file name, without any directory part.
    fn name(&self) -> &str;

    /// Whether the entry is a directory.
    fn is_directory(&self) -> bool;

    /// Opens a fresh read stream over the entry's content.
    ///
    /// Every call starts from the beginning of the file.
    fn open_read(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Last modification time in milliseconds since the Unix epoch.
    fn last_modified(&self) -> u64;

    /// Content length in bytes.
    fn length(&self) -> u64;

    /// Location on disk, if the tree is backed by one.
    ///
    /// Only used to point diagnostics at the real file.
    fn physical_path(&self) -> Option<&Utf8Path> {
        None
    }
}

/// A hierarchical, read-only file store.
///
/// # Examples
///
/// ```
/// use tmpl_compiler::{FileTree, MemoryFileTree};
///
/// let tree = MemoryFileTree::new()
///     .with_file("views/index.tmpl", "<h1>Hi</h1>")
///     .with_file("readme.txt", "notes");
///
/// let root = tree.list_directory("").unwrap_or_default();
/// let names: Vec<_> = root.iter().map(|entry| entry.name().to_owned()).collect();
/// assert_eq!(names, ["readme.txt", "views"]);
/// assert!(tree.list_directory("missing").is_none());
/// ```
pub trait FileTree: Send + Sync {
    /// Lists the entries of the directory at `path`.
    ///
    /// Returns `None` if the directory does not exist or cannot be listed.
    /// Listing failures are never errors.
    fn list_directory(&self, path: &str) -> Option<Vec<Box<dyn FileEntry>>>;
}

/// Converts a modification time into milliseconds since the Unix epoch.
///
/// Times before the epoch map to `0`.
pub(crate) fn system_time_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

// =============================================================================
// Physical tree
// =============================================================================

/// A [`FileTree`] over a directory on disk.
///
/// Directory names listed in `skip_dirs` are hidden wherever they occur.
/// When enabled, the root `.gitignore` and any extra ignore patterns are
/// applied to every entry.
///
/// Symlinked directories are hidden unless link following is enabled. Even
/// then, a link whose target is the listed directory or one of its
/// ancestors on the walked path is hidden, so cycles are never entered.
/// Symlinked files are always listed.
pub struct PhysicalFileTree {
    root: Utf8PathBuf,
    skip_dirs: FxHashSet<String>,
    ignore: Option<Gitignore>,
    follow_links: bool,
}

impl PhysicalFileTree {
    /// Creates a tree rooted at `root` with no filtering.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDirectory`] if `root` is not a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ConfigError> {
        if !root.is_dir() {
            return Err(ConfigError::MissingDirectory(root.to_owned()));
        }

        Ok(Self {
            root: root.to_owned(),
            skip_dirs: FxHashSet::default(),
            ignore: None,
            follow_links: false,
        })
    }

    /// Creates a tree from a build configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDirectory`] if the root does not exist,
    /// or [`ConfigError::InvalidOption`] if an ignore pattern is malformed.
    pub fn from_config(config: &BuildConfig) -> Result<Self, ConfigError> {
        let mut tree = Self::new(&config.root_path)?;
        tree.skip_dirs = config.skip_dirs.iter().cloned().collect();
        tree.ignore = build_ignore(&tree.root, config)?;
        tree.follow_links = config.follow_links;
        Ok(tree)
    }

    /// Hides directories with any of the given names.
    #[must_use]
    pub fn with_skip_dirs(mut self, dirs: &[&str]) -> Self {
        self.skip_dirs.extend(dirs.iter().map(ToString::to_string));
        self
    }

    /// Descends into symlinked directories that do not loop back.
    #[must_use]
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Returns the root directory.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn is_hidden(&self, path: &Utf8Path, name: &str, is_dir: bool) -> bool {
        if is_dir && self.skip_dirs.contains(name) {
            return true;
        }
        self.ignore
            .as_ref()
            .is_some_and(|ignore| ignore.matched(path, is_dir).is_ignore())
    }

    /// Whether the symlinked directory at `link` may be listed as a child of
    /// the directory at relative path `parent`.
    fn can_enter_link(&self, parent: &str, link: &Utf8Path) -> bool {
        if !self.follow_links {
            debug!(path = %link, "Skipping symlinked directory");
            return false;
        }
        let target = match fs::canonicalize(link) {
            Ok(target) => target,
            Err(err) => {
                debug!(path = %link, error = %err, "Skipping unresolvable symlink");
                return false;
            }
        };
        if self.walked_path(parent).any(|ancestor| ancestor == target) {
            debug!(path = %link, target = %target.display(), "Skipping symlink cycle");
            return false;
        }
        true
    }

    /// Canonical forms of the root and of every directory on the way down
    /// to `relative`.
    fn walked_path<'a>(&'a self, relative: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let mut current = self.root.clone();
        let steps = relative.split('/').filter(|step| !step.is_empty());
        std::iter::once(None)
            .chain(steps.map(Some))
            .filter_map(move |step| {
                if let Some(step) = step {
                    current.push(step);
                }
                fs::canonicalize(&current).ok()
            })
    }
}

impl fmt::Debug for PhysicalFileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicalFileTree")
            .field("root", &self.root)
            .field("skip_dirs", &self.skip_dirs)
            .field("ignore_rules", &self.ignore.as_ref().map_or(0, Gitignore::num_ignores))
            .field("follow_links", &self.follow_links)
            .finish()
    }
}

fn build_ignore(root: &Utf8Path, config: &BuildConfig) -> Result<Option<Gitignore>, ConfigError> {
    let gitignore_path = root.join(".gitignore");
    let use_gitignore = config.respect_gitignore && gitignore_path.is_file();
    if !use_gitignore && config.ignore_patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(root);
    if use_gitignore {
        if let Some(err) = builder.add(&gitignore_path) {
            warn!(path = %gitignore_path, error = %err, "Failed to load .gitignore");
        } else {
            debug!(path = %gitignore_path, "Loaded .gitignore");
        }
    }

    for pattern in &config.ignore_patterns {
        builder
            .add_line(None, pattern)
            .map_err(|err| ConfigError::invalid_option("ignore_patterns", err.to_string()))?;
    }

    builder
        .build()
        .map(Some)
        .map_err(|err| ConfigError::invalid_option("ignore_patterns", err.to_string()))
}

impl FileTree for PhysicalFileTree {
    fn list_directory(&self, path: &str) -> Option<Vec<Box<dyn FileEntry>>> {
        let dir = if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        };

        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(err) => {
                debug!(path = %dir, error = %err, "Cannot list directory");
                return None;
            }
        };

        let mut entries: Vec<Box<dyn FileEntry>> = Vec::new();
        for item in read_dir {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    debug!(path = %dir, error = %err, "Skipping unreadable directory entry");
                    continue;
                }
            };

            let Ok(name) = item.file_name().into_string() else {
                debug!(path = %dir, "Skipping entry with non-UTF-8 name");
                continue;
            };

            let entry_path = dir.join(&name);
            let is_link = item.file_type().is_ok_and(|kind| kind.is_symlink());
            let metadata = match fs::metadata(&entry_path) {
                Ok(metadata) => metadata,
                Err(err) => {
                    debug!(path = %entry_path, error = %err, "Skipping entry without metadata");
                    continue;
                }
            };

            let is_directory = metadata.is_dir();
            if self.is_hidden(&entry_path, &name, is_directory) {
                continue;
            }
            if is_link && is_directory && !self.can_enter_link(path, &entry_path) {
                continue;
            }

            entries.push(Box::new(PhysicalEntry {
                name,
                path: entry_path,
                is_directory,
                last_modified: metadata.modified().map_or(0, system_time_millis),
                length: if is_directory { 0 } else { metadata.len() },
            }));
        }

        Some(entries)
    }
}

/// A file or directory on disk.
#[derive(Debug, Clone)]
struct PhysicalEntry {
    name: String,
    path: Utf8PathBuf,
    is_directory: bool,
    last_modified: u64,
    length: u64,
}

impl FileEntry for PhysicalEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.is_directory
    }

    fn open_read(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn last_modified(&self) -> u64 {
        self.last_modified
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn physical_path(&self) -> Option<&Utf8Path> {
        Some(&self.path)
    }
}

// =============================================================================
// In-memory tree
// =============================================================================

/// A [`FileTree`] held entirely in memory.
///
/// Directories exist implicitly as prefixes of file paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileTree {
    files: BTreeMap<String, MemoryFile>,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Arc<[u8]>,
    last_modified: u64,
}

impl MemoryFileTree {
    /// Creates an empty tree.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file at `path` with a modification time of `0`.
    #[must_use]
    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.with_file_modified(path, content, 0)
    }

    /// Adds a file at `path` with the given modification time.
    #[must_use]
    pub fn with_file_modified(
        mut self,
        path: &str,
        content: impl AsRef<[u8]>,
        last_modified: u64,
    ) -> Self {
        self.insert(path, content, last_modified);
        self
    }

    /// Adds or replaces a file at `path`.
    pub fn insert(&mut self, path: &str, content: impl AsRef<[u8]>, last_modified: u64) {
        let path = path.trim_matches('/').to_owned();
        self.files.insert(
            path,
            MemoryFile {
                content: Arc::from(content.as_ref()),
                last_modified,
            },
        );
    }

    /// Removes the file at `path`, returning whether it existed.
    pub fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path.trim_matches('/')).is_some()
    }

    /// Number of files in the tree.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the tree holds no files.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileTree for MemoryFileTree {
    fn list_directory(&self, path: &str) -> Option<Vec<Box<dyn FileEntry>>> {
        let path = path.trim_matches('/');
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let mut entries: Vec<Box<dyn FileEntry>> = Vec::new();
        let mut last_directory: Option<&str> = None;
        let mut found = false;

        for (file_path, file) in self.files.range(prefix.clone()..) {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                break;
            };
            found = true;

            match rest.split_once('/') {
                Some((directory, _)) => {
                    // Keys are sorted, so a directory's files are contiguous.
                    if last_directory != Some(directory) {
                        last_directory = Some(directory);
                        entries.push(Box::new(MemoryEntry::directory(directory)));
                    }
                }
                None => entries.push(Box::new(MemoryEntry::file(rest, file))),
            }
        }

        (found || path.is_empty()).then_some(entries)
    }
}

/// An entry of a [`MemoryFileTree`] listing.
#[derive(Debug, Clone)]
struct MemoryEntry {
    name: String,
    content: Option<Arc<[u8]>>,
    last_modified: u64,
}

impl MemoryEntry {
    fn directory(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            content: None,
            last_modified: 0,
        }
    }

    fn file(name: &str, file: &MemoryFile) -> Self {
        Self {
            name: name.to_owned(),
            content: Some(Arc::clone(&file.content)),
            last_modified: file.last_modified,
        }
    }
}

impl FileEntry for MemoryEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_directory(&self) -> bool {
        self.content.is_none()
    }

    fn open_read(&self) -> io::Result<Box<dyn Read + '_>> {
        match &self.content {
            Some(content) => Ok(Box::new(&content[..])),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", self.name),
            )),
        }
    }

    fn last_modified(&self) -> u64 {
        self.last_modified
    }

    fn length(&self) -> u64 {
        self.content
            .as_ref()
            .map_or(0, |content| content.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[Box<dyn FileEntry>]) -> Vec<(String, bool)> {
        let mut names: Vec<_> = entries
            .iter()
            .map(|entry| (entry.name().to_owned(), entry.is_directory()))
            .collect();
        names.sort();
        names
    }

    fn read_all(entry: &dyn FileEntry) -> String {
        let mut content = String::new();
        entry.open_read().unwrap().read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_memory_tree_lists_immediate_children() {
        let tree = MemoryFileTree::new()
            .with_file("views/home/index.tmpl", "a")
            .with_file("views/home/about.tmpl", "b")
            .with_file("views/_partial.tmpl", "c")
            .with_file("notes.txt", "d");

        let root = tree.list_directory("").unwrap();
        assert_eq!(
            names(&root),
            [("notes.txt".to_owned(), false), ("views".to_owned(), true)]
        );

        let views = tree.list_directory("views").unwrap();
        assert_eq!(
            names(&views),
            [("_partial.tmpl".to_owned(), false), ("home".to_owned(), true)]
        );

        let home = tree.list_directory("views/home/").unwrap();
        assert_eq!(home.len(), 2);
    }

    #[test]
    fn test_memory_tree_missing_directory() {
        let tree = MemoryFileTree::new().with_file("views/a.tmpl", "a");
        assert!(tree.list_directory("nope").is_none());
        assert!(tree.list_directory("view").is_none());
        assert!(MemoryFileTree::new().list_directory("").unwrap().is_empty());
    }

    #[test]
    fn test_memory_entry_reads_are_independent() {
        let tree = MemoryFileTree::new().with_file_modified("a.tmpl", "hello", 42);
        let entries = tree.list_directory("").unwrap();
        let entry = entries[0].as_ref();

        assert_eq!(read_all(entry), "hello");
        assert_eq!(read_all(entry), "hello");
        assert_eq!(entry.length(), 5);
        assert_eq!(entry.last_modified(), 42);
        assert!(entry.physical_path().is_none());
    }

    #[test]
    fn test_memory_tree_insert_and_remove() {
        let mut tree = MemoryFileTree::new();
        tree.insert("/a.tmpl", "x", 1);
        assert_eq!(tree.len(), 1);
        assert!(tree.remove("a.tmpl"));
        assert!(!tree.remove("a.tmpl"));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_physical_tree_missing_root() {
        let err = PhysicalFileTree::new(Utf8Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDirectory(_)));
    }

    #[test]
    fn test_physical_tree_lists_disk_entries() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        fs::create_dir_all(root.join("views")).unwrap();
        fs::write(root.join("views/index.tmpl"), "<h1>Hi</h1>").unwrap();

        let tree = PhysicalFileTree::new(root).unwrap();
        let top = tree.list_directory("").unwrap();
        assert_eq!(names(&top), [("views".to_owned(), true)]);

        let views = tree.list_directory("views").unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(read_all(views[0].as_ref()), "<h1>Hi</h1>");
        assert_eq!(views[0].length(), 11);
        assert_eq!(
            views[0].physical_path(),
            Some(root.join("views/index.tmpl").as_path())
        );
        assert!(tree.list_directory("missing").is_none());
    }

    #[test]
    fn test_physical_tree_applies_skip_dirs_and_ignore_rules() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        for dir in ["views", "node_modules", "drafts"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join(".gitignore"), "drafts/\n").unwrap();
        fs::write(root.join("views/a.tmpl"), "a").unwrap();
        fs::write(root.join("views/b.bak.tmpl"), "b").unwrap();

        let config = BuildConfig {
            root_path: root.to_owned(),
            ignore_patterns: vec!["*.bak.tmpl".to_owned()],
            ..BuildConfig::default()
        };
        let tree = PhysicalFileTree::from_config(&config).unwrap();

        let top = tree.list_directory("").unwrap();
        assert_eq!(
            names(&top),
            [(".gitignore".to_owned(), false), ("views".to_owned(), true)]
        );
        let views = tree.list_directory("views").unwrap();
        assert_eq!(names(&views), [("a.tmpl".to_owned(), false)]);
    }

    #[test]
    fn test_physical_tree_gitignore_can_be_disabled() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join(".gitignore"), "drafts/\n").unwrap();

        let config = BuildConfig {
            root_path: root.to_owned(),
            respect_gitignore: false,
            ..BuildConfig::default()
        };
        let tree = PhysicalFileTree::from_config(&config).unwrap();
        let top = tree.list_directory("").unwrap();
        assert!(top.iter().any(|entry| entry.name() == "drafts"));
    }

    #[cfg(unix)]
    fn symlinked_tree() -> (tempfile::TempDir, tempfile::TempDir) {
        use std::os::unix::fs::symlink;

        let temp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("views/nested")).unwrap();
        fs::write(root.join("views/a.tmpl"), "a").unwrap();
        fs::write(outside.path().join("shared.tmpl"), "s").unwrap();

        symlink(root.join("views"), root.join("views/loop")).unwrap();
        symlink(root, root.join("views/nested/up")).unwrap();
        symlink(outside.path(), root.join("views/shared")).unwrap();
        symlink(root.join("views/a.tmpl"), root.join("alias.tmpl")).unwrap();
        (temp, outside)
    }

    #[cfg(unix)]
    #[test]
    fn test_physical_tree_skips_symlinked_directories_by_default() {
        let (temp, _outside) = symlinked_tree();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        let tree = PhysicalFileTree::new(root).unwrap();

        let top = tree.list_directory("").unwrap();
        assert_eq!(
            names(&top),
            [("alias.tmpl".to_owned(), false), ("views".to_owned(), true)]
        );
        let views = tree.list_directory("views").unwrap();
        assert_eq!(
            names(&views),
            [("a.tmpl".to_owned(), false), ("nested".to_owned(), true)]
        );
        assert!(tree.list_directory("views/nested").unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_physical_tree_follows_links_without_cycles() {
        let (temp, _outside) = symlinked_tree();
        let root = Utf8Path::from_path(temp.path()).unwrap();
        let config = BuildConfig {
            root_path: root.to_owned(),
            follow_links: true,
            ..BuildConfig::default()
        };
        let tree = PhysicalFileTree::from_config(&config).unwrap();

        let views = tree.list_directory("views").unwrap();
        assert_eq!(
            names(&views),
            [
                ("a.tmpl".to_owned(), false),
                ("nested".to_owned(), true),
                ("shared".to_owned(), true),
            ]
        );
        assert!(tree.list_directory("views/nested").unwrap().is_empty());

        let shared = tree.list_directory("views/shared").unwrap();
        assert_eq!(names(&shared), [("shared.tmpl".to_owned(), false)]);
    }

    #[test]
    fn test_system_time_millis() {
        assert_eq!(system_time_millis(UNIX_EPOCH), 0);
        let later = UNIX_EPOCH + std::time::Duration::from_millis(1_500);
        assert_eq!(system_time_millis(later), 1_500);
    }
}
