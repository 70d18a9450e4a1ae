//! Source location types for positions in template files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position within a template source.
///
/// Both `line` and `column` are 1-indexed; `column` counts characters, not
/// bytes, so it matches what an editor shows.
///
/// # Examples
///
/// ```
/// use tmpl_core::SourceLocation;
///
/// let loc = SourceLocation::new(3, 14);
/// assert_eq!(loc.to_string(), "3:14");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (1-indexed).
    pub column: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
