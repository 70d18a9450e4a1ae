//! Catalog staleness checks.
//!
//! Compares a previously built [`TemplateCatalog`] against the current
//! state of a [`FileTree`]. The content hash is authoritative: a template
//! whose bytes are unchanged is never stale, even if its timestamp or the
//! reported length moved.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tmpl_core::TemplateCatalog;
use tracing::{debug, warn};

use crate::file_tree::{FileEntry, FileTree};
use crate::fingerprint;
use crate::walker::TemplateWalker;

/// State of one template relative to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    /// Content and metadata match the catalog.
    Fresh,
    /// Content matches, but timestamp or length differ.
    Touched,
    /// Content differs from the catalogued hash.
    Modified,
    /// The catalogued template no longer exists.
    Missing,
    /// The template exists but could not be read.
    Unreadable,
    /// A template exists that the catalog does not know about.
    Added,
}

impl Staleness {
    /// Returns `true` if the catalog must be rebuilt for this template.
    #[inline]
    #[must_use]
    pub const fn is_stale(self) -> bool {
        !matches!(self, Self::Fresh | Self::Touched)
    }

    /// Lowercase label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Touched => "touched",
            Self::Modified => "modified",
            Self::Missing => "missing",
            Self::Unreadable => "unreadable",
            Self::Added => "added",
        }
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Staleness of one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessEntry {
    /// Relative path of the template.
    pub relative_path: String,
    /// Its state.
    pub status: Staleness,
}

/// Result of comparing a catalog with a file tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessReport {
    /// One entry per catalogued template, in catalog order, followed by
    /// templates missing from the catalog in traversal order.
    pub entries: Vec<StalenessEntry>,
}

impl StalenessReport {
    /// Returns `true` if any template is stale.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.entries.iter().any(|entry| entry.status.is_stale())
    }

    /// Iterates over stale entries.
    pub fn stale(&self) -> impl Iterator<Item = &StalenessEntry> {
        self.entries.iter().filter(|entry| entry.status.is_stale())
    }

    /// Number of entries with the given status.
    #[must_use]
    pub fn count(&self, status: Staleness) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    /// Status of the template at `relative_path`, if it was checked.
    #[must_use]
    pub fn status_of(&self, relative_path: &str) -> Option<Staleness> {
        self.entries
            .iter()
            .find(|entry| entry.relative_path == relative_path)
            .map(|entry| entry.status)
    }
}

/// Checks every catalogued template against `tree`, then looks for
/// templates the catalog does not contain.
///
/// # Examples
///
/// ```
/// use tmpl_compiler::{check_staleness, MemoryFileTree, Staleness, TemplateCatalogBuilder};
///
/// let tree = MemoryFileTree::new().with_file("index.tmpl", "<h1>Hi</h1>");
/// let builder = TemplateCatalogBuilder::default();
/// let catalog = builder.build(&tree)?.catalog;
///
/// let changed = MemoryFileTree::new().with_file("index.tmpl", "<h1>Bye</h1>");
/// let report = check_staleness(&catalog, &changed, builder.walker());
/// assert_eq!(report.status_of("index.tmpl"), Some(Staleness::Modified));
/// # Ok::<(), tmpl_compiler::BuildError>(())
/// ```
pub fn check_staleness(
    catalog: &TemplateCatalog,
    tree: &dyn FileTree,
    walker: &TemplateWalker,
) -> StalenessReport {
    let mut listings: FxHashMap<String, Option<Vec<Box<dyn FileEntry>>>> = FxHashMap::default();
    let mut entries = Vec::with_capacity(catalog.len());

    for descriptor in catalog {
        let (directory, name) = split_path(&descriptor.relative_path);
        let listing = listings
            .entry(directory.to_owned())
            .or_insert_with(|| tree.list_directory(directory));
        let entry = listing.as_ref().and_then(|items| {
            items
                .iter()
                .find(|item| !item.is_directory() && item.name() == name)
        });

        let status = match entry {
            None => Staleness::Missing,
            Some(entry) => match fingerprint::hash_entry(entry.as_ref()) {
                Err(err) => {
                    warn!(path = %descriptor.relative_path, error = %err, "Cannot read template");
                    Staleness::Unreadable
                }
                Ok(hash) if hash != descriptor.content_hash => Staleness::Modified,
                Ok(_) => {
                    let same_metadata = entry.length() == descriptor.length
                        && entry.last_modified() == descriptor.last_modified;
                    if same_metadata {
                        Staleness::Fresh
                    } else {
                        Staleness::Touched
                    }
                }
            },
        };

        debug!(path = %descriptor.relative_path, status = %status, "Checked template");
        entries.push(StalenessEntry {
            relative_path: descriptor.relative_path.clone(),
            status,
        });
    }

    let known: FxHashSet<&str> = catalog
        .iter()
        .map(|descriptor| descriptor.relative_path.as_str())
        .collect();
    for file in walker.collect(tree) {
        if !known.contains(file.relative_path()) {
            entries.push(StalenessEntry {
                relative_path: file.relative_path().to_owned(),
                status: Staleness::Added,
            });
        }
    }

    StalenessReport { entries }
}

fn split_path(relative_path: &str) -> (&str, &str) {
    relative_path.rsplit_once('/').unwrap_or(("", relative_path))
}
