//! Error types for the tmpl-compiler crate.
//!
//! This module provides the [`BuildError`] type for failures that abort a
//! catalog build.
//!
//! Problems inside templates are *not* errors here: they are reported as
//! [`Diagnostic`](tmpl_core::Diagnostic)s and the build continues. A
//! `BuildError` means no trustworthy catalog can be produced.

use camino::{Utf8Path, Utf8PathBuf};
use tmpl_core::ConfigError;
use tmpl_parser::ParseError;

/// Errors that abort a catalog build.
///
/// # Error Recovery Strategy
///
/// - **Unreadable directories**: not an error, treated as empty
/// - **Route scan read failures**: not an error, the template has no route
/// - **Everything below**: fatal, no partial catalog is returned
///
/// # Examples
///
/// ```
/// use tmpl_compiler::BuildError;
///
/// fn describe(err: &BuildError) -> String {
///     match err.path() {
///         Some(path) => format!("{path}: {err}"),
///         None => err.to_string(),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The template translator malfunctioned.
    #[error("template translator failed on {path}: {source}")]
    Parser {
        /// Relative path of the template being translated.
        path: Utf8PathBuf,
        /// The translator's error.
        #[source]
        source: ParseError,
    },

    /// A template could not be read for fingerprinting.
    #[error("failed to read template {path}: {source}")]
    Read {
        /// Relative path of the template.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A generated unit is not valid Rust and cannot be registered.
    #[error("generated code for {path} is malformed: {source}")]
    Registry {
        /// Relative path of the template that produced the unit.
        path: Utf8PathBuf,
        /// The syntax error in the generated unit.
        #[source]
        source: syn::Error,
    },

    /// The build was configured with invalid options.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// Creates a new [`BuildError::Parser`] error.
    #[inline]
    pub fn parser(path: impl Into<Utf8PathBuf>, source: ParseError) -> Self {
        Self::Parser {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`BuildError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`BuildError::Registry`] error.
    #[inline]
    pub fn registry(path: impl Into<Utf8PathBuf>, source: syn::Error) -> Self {
        Self::Registry {
            path: path.into(),
            source,
        }
    }

    /// Returns the relative path of the template this error concerns, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Parser { path, .. } | Self::Read { path, .. } | Self::Registry { path, .. } => {
                Some(path)
            }
            Self::Config(_) => None,
        }
    }
}
