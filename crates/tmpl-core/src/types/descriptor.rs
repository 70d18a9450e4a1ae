//! Compiled template descriptors and the catalog that holds them.
//!
//! A [`TemplateDescriptor`] is produced once per successfully translated
//! template during a build and never mutated afterwards. The
//! [`TemplateCatalog`] of one build replaces the previous catalog wholesale.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::content_hash::ContentHash;

/// The durable record of one compiled template.
///
/// The fields are sufficient both for mapping a requested template path to
/// its generated type and for deciding whether a cached artifact is stale
/// (by comparing `length`, `last_modified` and `content_hash` against the
/// file on disk).
///
/// # Examples
///
/// ```
/// use tmpl_core::{ContentHash, TemplateDescriptor};
///
/// let descriptor = TemplateDescriptor {
///     full_type_name: "views_home_index::Index".to_owned(),
///     relative_path: "views/home/index.tmpl".to_owned(),
///     last_modified: 1_704_067_200_000,
///     length: 24,
///     content_hash: ContentHash::default(),
///     route: Some("index".to_owned()),
/// };
///
/// assert_eq!(descriptor.route(), Some("index"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Synthesized type name of the generated unit, unique within a catalog.
    pub full_type_name: String,

    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,

    /// Last modification time in milliseconds since the Unix epoch.
    pub last_modified: u64,

    /// File length in bytes.
    pub length: u64,

    /// Digest of the file's full byte content.
    pub content_hash: ContentHash,

    /// Routing hint extracted from the template's leading lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

impl TemplateDescriptor {
    /// Returns the route as a string slice.
    #[inline]
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }
}

/// The ordered collection of descriptors produced by one build.
///
/// Ordering follows the build's deterministic traversal order, so two builds
/// over an unchanged tree produce identical catalogs.
///
/// # Examples
///
/// ```
/// use tmpl_core::{ContentHash, TemplateCatalog, TemplateDescriptor};
///
/// let catalog = TemplateCatalog::from(vec![TemplateDescriptor {
///     full_type_name: "about::About".to_owned(),
///     relative_path: "about.tmpl".to_owned(),
///     last_modified: 0,
///     length: 5,
///     content_hash: ContentHash::default(),
///     route: None,
/// }]);
///
/// assert_eq!(catalog.len(), 1);
/// assert!(catalog.get("about.tmpl").is_some());
/// assert!(catalog.get_by_type_name("about::About").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    templates: Vec<TemplateDescriptor>,
}

impl TemplateCatalog {
    /// Creates an empty catalog.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of descriptors.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if the catalog has no descriptors.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterates descriptors in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, TemplateDescriptor> {
        self.templates.iter()
    }

    /// Descriptors as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    /// Looks up a descriptor by its relative path.
    #[must_use]
    pub fn get(&self, relative_path: &str) -> Option<&TemplateDescriptor> {
        self.templates
            .iter()
            .find(|d| d.relative_path == relative_path)
    }

    /// Looks up a descriptor by its full type name.
    #[must_use]
    pub fn get_by_type_name(&self, full_type_name: &str) -> Option<&TemplateDescriptor> {
        self.templates
            .iter()
            .find(|d| d.full_type_name == full_type_name)
    }

    /// Builds a relative-path index for repeated lookups.
    #[must_use]
    pub fn index_by_path(&self) -> FxHashMap<&str, &TemplateDescriptor> {
        self.templates
            .iter()
            .map(|d| (d.relative_path.as_str(), d))
            .collect()
    }

    /// Serializes the catalog as a pretty-printed JSON manifest.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads a catalog from a JSON manifest.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<TemplateDescriptor>> for TemplateCatalog {
    fn from(templates: Vec<TemplateDescriptor>) -> Self {
        Self { templates }
    }
}

impl IntoIterator for TemplateCatalog {
    type Item = TemplateDescriptor;
    type IntoIter = std::vec::IntoIter<TemplateDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.templates.into_iter()
    }
}

impl<'a> IntoIterator for &'a TemplateCatalog {
    type Item = &'a TemplateDescriptor;
    type IntoIter = std::slice::Iter<'a, TemplateDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.templates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(path: &str, type_name: &str, route: Option<&str>) -> TemplateDescriptor {
        TemplateDescriptor {
            full_type_name: type_name.to_owned(),
            relative_path: path.to_owned(),
            last_modified: 1_700_000_000_000,
            length: 42,
            content_hash: ContentHash::new([7; ContentHash::LEN]),
            route: route.map(str::to_owned),
        }
    }

    fn sample_catalog() -> TemplateCatalog {
        TemplateCatalog::from(vec![
            descriptor("views/home/index.tmpl", "views_home_index::Index", Some("index")),
            descriptor("views/_partial.tmpl", "views__partial::Partial", None),
        ])
    }

    #[test]
    fn test_lookup_by_path_and_type() {
        let catalog = sample_catalog();
        assert_eq!(
            catalog.get("views/home/index.tmpl").and_then(TemplateDescriptor::route),
            Some("index")
        );
        assert_eq!(
            catalog
                .get_by_type_name("views__partial::Partial")
                .map(|d| d.relative_path.as_str()),
            Some("views/_partial.tmpl")
        );
        assert!(catalog.get("missing.tmpl").is_none());
    }

    #[test]
    fn test_index_by_path() {
        let catalog = sample_catalog();
        let index = catalog.index_by_path();
        assert_eq!(index.len(), 2);
        assert!(index.contains_key("views/_partial.tmpl"));
    }

    #[test]
    fn test_json_manifest_round_trip() {
        let catalog = sample_catalog();
        let json = catalog.to_json_pretty().unwrap();
        assert!(json.contains("\"templates\""));
        assert!(json.contains(&"07".repeat(32)));

        let parsed = TemplateCatalog::from_json(&json).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_manifest_omits_absent_route() {
        let catalog = TemplateCatalog::from(vec![descriptor("a.tmpl", "a::A", None)]);
        let json = serde_json::to_string(&catalog).unwrap();
        assert!(!json.contains("route"));
    }

    #[test]
    fn test_iteration_preserves_order() {
        let catalog = sample_catalog();
        let paths: Vec<_> = catalog.iter().map(|d| d.relative_path.as_str()).collect();
        assert_eq!(paths, ["views/home/index.tmpl", "views/_partial.tmpl"]);
    }
}
