//! Build diagnostics.
//!
//! Diagnostics are appended to a build's sink and never removed; they are
//! handed to the caller together with the catalog, so a successful build may
//! still carry errors for individual templates.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use super::location::SourceLocation;

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Severity {
    /// Informational note.
    Info,
    /// Suspicious but translatable input.
    Warning,
    /// Input that could not be translated as written.
    Error,
}

impl Severity {
    /// Returns the lowercase label used in rendered diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A message about one template source file.
///
/// # Examples
///
/// ```
/// use tmpl_core::{Diagnostic, Severity, SourceLocation};
///
/// let diagnostic = Diagnostic::error("views/index.tmpl", "unterminated expression")
///     .with_location(SourceLocation::new(2, 5));
///
/// assert_eq!(diagnostic.severity, Severity::Error);
/// assert_eq!(
///     diagnostic.to_string(),
///     "views/index.tmpl:2:5: error: unterminated expression"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How serious the issue is.
    pub severity: Severity,

    /// Human-readable description.
    pub message: String,

    /// Path of the source file the diagnostic refers to.
    pub path: Utf8PathBuf,

    /// Position within the file, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// Creates a diagnostic without a location.
    #[must_use]
    pub fn new(severity: Severity, path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            path: path.into(),
            location: None,
        }
    }

    /// Creates an error-severity diagnostic.
    #[must_use]
    pub fn error(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, path, message)
    }

    /// Attaches a source location.
    #[must_use]
    pub const fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns `true` for error-severity diagnostics.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns `true` if this diagnostic refers to `path`.
    #[must_use]
    pub fn refers_to(&self, path: &Utf8Path) -> bool {
        self.path == path
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(
                f,
                "{}:{}: {}: {}",
                self.path, location, self.severity, self.message
            ),
            None => write!(f, "{}: {}: {}", self.path, self.severity, self.message),
        }
    }
}
