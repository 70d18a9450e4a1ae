//! Error types for the tmpl-parser crate.
//!
//! Two kinds of failure exist and they must not be confused:
//!
//! - [`TemplateError`] is a problem *in the template* (bad syntax). It is
//!   reported alongside the generated code and never stops a build.
//! - [`ParseError`] is a failure *of the translator* (the source could not be
//!   read, or the translator hit an internal fault). It aborts the build.

use std::fmt;

use camino::Utf8Path;
use tmpl_core::{Diagnostic, SourceLocation};

/// A syntax problem reported by the translator for one template.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use tmpl_core::SourceLocation;
/// use tmpl_parser::TemplateError;
///
/// let error = TemplateError::new("unterminated expression", SourceLocation::new(1, 4));
/// let diagnostic = error.to_diagnostic(Utf8Path::new("views/a.tmpl"));
/// assert_eq!(diagnostic.to_string(), "views/a.tmpl:1:4: error: unterminated expression");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateError {
    /// Human-readable description.
    pub message: String,
    /// Where the problem starts.
    pub location: SourceLocation,
}

impl TemplateError {
    /// Creates a new template error.
    #[must_use]
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    /// Converts the error into an error-severity [`Diagnostic`] for `path`.
    #[must_use]
    pub fn to_diagnostic(&self, path: &Utf8Path) -> Diagnostic {
        Diagnostic::error(path, self.message.clone()).with_location(self.location)
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// A translator malfunction.
///
/// Unlike [`TemplateError`], this is not about the template's content: the
/// translator could not do its job, so no output for the file can be trusted.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The template source stream could not be read.
    #[error("failed to read template {path}: {source}")]
    Read {
        /// Logical path of the template.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The translator reached a state it cannot recover from.
    #[error("translator failure on {path}: {message}")]
    Internal {
        /// Logical path of the template.
        path: String,
        /// Description of the fault.
        message: String,
    },
}

impl ParseError {
    /// Creates a new [`ParseError::Internal`] error.
    #[inline]
    pub fn internal(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmpl_core::Severity;

    #[test]
    fn test_template_error_display() {
        let error = TemplateError::new("empty expression", SourceLocation::new(2, 7));
        assert_eq!(error.to_string(), "2:7: empty expression");
    }

    #[test]
    fn test_template_error_to_diagnostic() {
        let error = TemplateError::new("bad", SourceLocation::new(3, 1));
        let diagnostic = error.to_diagnostic(Utf8Path::new("/app/views/a.tmpl"));
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.location, Some(SourceLocation::new(3, 1)));
        assert_eq!(diagnostic.path.as_str(), "/app/views/a.tmpl");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::Read {
            path: "views/a.tmpl".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("views/a.tmpl"));

        let err = ParseError::internal("views/b.tmpl", "stack exhausted");
        assert_eq!(
            err.to_string(),
            "translator failure on views/b.tmpl: stack exhausted"
        );
    }
}
