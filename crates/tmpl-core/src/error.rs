//! Configuration errors shared by every tmpl crate.

use camino::Utf8PathBuf;

/// A build configuration that cannot be loaded or used.
///
/// # Examples
///
/// ```
/// use tmpl_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingDirectory(Utf8PathBuf::from("/some/views"));
/// assert!(error.to_string().contains("/some/views"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The template root is not a directory.
    #[error("template root is not a directory: {0}")]
    MissingDirectory(Utf8PathBuf),

    /// An option holds a value the build cannot use.
    #[error("bad value for '{option}': {reason}")]
    InvalidOption {
        /// Option name, as spelled in `tmpl.json`.
        option: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Why reading failed.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`Config`](crate::Config).
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidOption`].
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_names_the_path() {
        let error = ConfigError::MissingDirectory(Utf8PathBuf::from("site/views"));
        assert_eq!(
            error.to_string(),
            "template root is not a directory: site/views"
        );
    }

    #[test]
    fn test_invalid_option_names_option_and_reason() {
        let error = ConfigError::invalid_option("max_parallel_jobs", "must be positive");
        assert_eq!(
            error.to_string(),
            "bad value for 'max_parallel_jobs': must be positive"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let error = ConfigError::Io {
            path: Utf8PathBuf::from("tmpl.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(error.to_string().starts_with("cannot read tmpl.json"));
        assert!(error.source().is_some());
    }
}
