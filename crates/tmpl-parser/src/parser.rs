//! The translator interface and its default implementation.

use std::io::Read;

use smallvec::SmallVec;
use tmpl_core::SourceLocation;
use tracing::debug;

use crate::codegen;
use crate::error::{ParseError, TemplateError};
use crate::syntax;

/// Output of translating one template.
///
/// `generated_code` is `None` when the template has nothing to render
/// (empty, whitespace-only or layout-only). `errors` may be non-empty even
/// when code was generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCodeResult {
    /// The generated Rust source unit.
    pub generated_code: Option<String>,

    /// Problems found in the template, in source order.
    ///
    /// Uses `SmallVec<[TemplateError; 4]>`; most templates report none.
    pub errors: SmallVec<[TemplateError; 4]>,
}

impl GeneratedCodeResult {
    /// Returns `true` if translation reported no errors.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Translates template source into a generated code unit.
///
/// Implementations must be pure: the same bytes and logical path always
/// produce the same generated code and the same error list. Problems in the
/// template are reported through [`GeneratedCodeResult::errors`]; an `Err`
/// means the translator itself failed and aborts the whole build.
///
/// # Thread Safety
///
/// Parsers are `Send + Sync` so a single instance can serve a parallel build.
///
/// # Examples
///
/// ```
/// use tmpl_parser::{MarkupParser, TemplateParser};
///
/// let parser = MarkupParser::new();
/// let mut source: &[u8] = b"<h1>@{title}</h1>";
/// let result = parser.parse(&mut source, "views/index.tmpl")?;
///
/// assert!(result.is_clean());
/// assert!(result.generated_code.is_some());
/// # Ok::<(), tmpl_parser::ParseError>(())
/// ```
pub trait TemplateParser: Send + Sync {
    /// Translates the template read from `content`.
    ///
    /// `logical_path` is the template's path relative to the scan root and
    /// is used to name the generated unit.
    fn parse(
        &self,
        content: &mut dyn Read,
        logical_path: &str,
    ) -> Result<GeneratedCodeResult, ParseError>;
}

/// The default markup translator.
///
/// Supports interpolation (`@{key}`), comments (`@* *@`), the `@@` escape
/// and the `@route` and `@layout` line directives.
/// A UTF-8 byte order mark is ignored; invalid UTF-8 is decoded lossily and
/// reported as an error on line 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupParser {
    _private: (),
}

impl MarkupParser {
    /// Creates a new translator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates an in-memory template.
    #[must_use]
    pub fn parse_str(&self, source: &str, logical_path: &str) -> GeneratedCodeResult {
        translate(source, logical_path, SmallVec::new())
    }
}

impl TemplateParser for MarkupParser {
    fn parse(
        &self,
        content: &mut dyn Read,
        logical_path: &str,
    ) -> Result<GeneratedCodeResult, ParseError> {
        let mut bytes = Vec::new();
        content
            .read_to_end(&mut bytes)
            .map_err(|source| ParseError::Read {
                path: logical_path.to_owned(),
                source,
            })?;

        let mut errors = SmallVec::new();
        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(err) => {
                errors.push(TemplateError::new(
                    "template is not valid UTF-8",
                    SourceLocation::default(),
                ));
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };

        Ok(translate(&source, logical_path, errors))
    }
}

fn translate(
    source: &str,
    logical_path: &str,
    mut errors: SmallVec<[TemplateError; 4]>,
) -> GeneratedCodeResult {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let tree = syntax::scan(source);
    errors.extend(tree.errors.iter().cloned());

    let generated_code = tree
        .has_renderable_content()
        .then(|| codegen::generate(logical_path, &tree));

    debug!(
        path = logical_path,
        errors = errors.len(),
        generated = generated_code.is_some(),
        "Translated template"
    );

    GeneratedCodeResult {
        generated_code,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    fn parse_bytes(bytes: &[u8], path: &str) -> GeneratedCodeResult {
        let mut reader = bytes;
        MarkupParser::new().parse(&mut reader, path).unwrap()
    }

    #[test]
    fn test_clean_template() {
        let result = parse_bytes(b"@route index\n<h1>Hi</h1>", "views/home/index.tmpl");
        assert!(result.is_clean());
        let code = result.generated_code.unwrap();
        assert!(code.contains("views_home_index"));
        assert!(code.contains("Index"));
    }

    #[test]
    fn test_errors_do_not_suppress_code() {
        let result = parse_bytes(b"<nav>@{ oops</nav>", "views/_partial.tmpl");
        assert_eq!(result.errors.len(), 1);
        assert!(result.generated_code.is_some());
    }

    #[test]
    fn test_empty_and_layout_only_templates_produce_no_code() {
        assert!(parse_bytes(b"", "a.tmpl").generated_code.is_none());
        assert!(parse_bytes(b"   \r\n", "a.tmpl").generated_code.is_none());
        assert!(parse_bytes(b"@layout main\n", "a.tmpl").generated_code.is_none());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let result = parse_bytes("\u{feff}@route x\nbody".as_bytes(), "a.tmpl");
        assert!(result.is_clean());
        assert!(result.generated_code.is_some());
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        let result = parse_bytes(b"<p>\xff</p>", "a.tmpl");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("UTF-8"));
        assert!(result.generated_code.is_some());
    }

    #[test]
    fn test_read_failure_is_a_malfunction() {
        let result = MarkupParser::new().parse(&mut FailingReader, "views/a.tmpl");
        assert!(matches!(result, Err(ParseError::Read { path, .. }) if path == "views/a.tmpl"));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let source = "@layout main\n<ul>@{items}</ul>";
        let parser = MarkupParser::new();
        assert_eq!(
            parser.parse_str(source, "list.tmpl"),
            parser.parse_str(source, "list.tmpl")
        );
    }
}
