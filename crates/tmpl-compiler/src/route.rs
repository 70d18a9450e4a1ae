//! Route directive extraction.
//!
//! A template may name the route it serves in a comment near its top:
//!
//! ```text
//! @* @route orders/{id} *@
//! ```
//!
//! Only the first [`MAX_SCANNED_LINES`] lines are inspected and the first
//! non-empty match wins. A directive further down the file is ignored.

use std::io::{self, BufRead, BufReader, Read};

/// The literal marker that introduces a route. The trailing space is part of
/// the marker.
pub const ROUTE_MARKER: &str = "@route ";

/// Number of leading lines inspected for a route directive.
pub const MAX_SCANNED_LINES: usize = 10;

/// Scans the leading lines of a template for a route directive.
///
/// # Examples
///
/// ```
/// use tmpl_compiler::RouteDirectiveScanner;
///
/// let scanner = RouteDirectiveScanner::new();
/// assert_eq!(scanner.scan_str("@route  /foo/bar  \n<p/>").as_deref(), Some("/foo/bar"));
/// assert_eq!(scanner.scan_str("  * @route orders *").as_deref(), Some("orders"));
/// assert_eq!(scanner.scan_str("no directive here"), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RouteDirectiveScanner {
    max_lines: usize,
}

impl Default for RouteDirectiveScanner {
    fn default() -> Self {
        Self {
            max_lines: MAX_SCANNED_LINES,
        }
    }
}

impl RouteDirectiveScanner {
    /// Creates a scanner inspecting the first [`MAX_SCANNED_LINES`] lines.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans a byte stream.
    ///
    /// Bytes are decoded as UTF-8, lossily. Reading stops after the last
    /// inspected line or at end of stream, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while reading the inspected lines.
    pub fn scan(&self, reader: impl Read) -> io::Result<Option<String>> {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        for _ in 0..self.max_lines {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if let Some(route) = route_from_line(&line) {
                return Ok(Some(route.to_owned()));
            }
        }

        Ok(None)
    }

    /// Scans an in-memory template.
    #[must_use]
    pub fn scan_str(&self, source: &str) -> Option<String> {
        source
            .lines()
            .take(self.max_lines)
            .find_map(route_from_line)
            .map(str::to_owned)
    }
}

/// Extracts the route value from a single line, if it carries one.
///
/// The value is everything after [`ROUTE_MARKER`] with whitespace, `*` and
/// `@` trimmed from both ends. An empty value is not a route.
#[must_use]
pub fn route_from_line(line: &str) -> Option<&str> {
    let start = line.find(ROUTE_MARKER)? + ROUTE_MARKER.len();
    let value = line[start..].trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '@');
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("read past the scanned lines"))
        }
    }

    fn scan(source: &str) -> Option<String> {
        RouteDirectiveScanner::new().scan(source.as_bytes()).unwrap()
    }

    #[test]
    fn test_route_values_are_trimmed() {
        assert_eq!(scan("@route  /foo/bar  ").as_deref(), Some("/foo/bar"));
        assert_eq!(scan("  * @route orders *").as_deref(), Some("orders"));
        assert_eq!(scan("@* @route orders/{id} *@\r\n<p/>").as_deref(), Some("orders/{id}"));
        assert_eq!(scan("\t@route\tx"), None);
    }

    #[test]
    fn test_no_route() {
        assert_eq!(scan("no directive here"), None);
        assert_eq!(scan(""), None);
        assert_eq!(scan("   \n\n  "), None);
        assert_eq!(scan("@routes x"), None);
        assert_eq!(scan("@Route x"), None);
    }

    #[test]
    fn test_empty_value_does_not_match() {
        assert_eq!(scan("@route  **\n@route second").as_deref(), Some("second"));
        assert_eq!(scan("@route "), None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(scan("@route first\n@route second").as_deref(), Some("first"));
    }

    #[test]
    fn test_only_first_ten_lines_are_scanned() {
        let mut source = "line\n".repeat(9);
        source.push_str("@route tenth\n");
        assert_eq!(scan(&source).as_deref(), Some("tenth"));

        let mut source = "line\n".repeat(10);
        source.push_str("@route eleventh\n");
        assert_eq!(scan(&source), None);
        assert_eq!(RouteDirectiveScanner::new().scan_str(&source), None);
    }

    #[test]
    fn test_never_reads_past_tenth_line() {
        let head = "line\n".repeat(10);
        let reader = head.as_bytes().chain(FailingReader);
        assert_eq!(RouteDirectiveScanner::new().scan(reader).unwrap(), None);
    }

    #[test]
    fn test_read_errors_propagate() {
        assert!(RouteDirectiveScanner::new().scan(FailingReader).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let bytes = b"\xff\xfe @route home\n";
        let route = RouteDirectiveScanner::new().scan(&bytes[..]).unwrap();
        assert_eq!(route.as_deref(), Some("home"));
    }

    #[test]
    fn test_scan_str_agrees_with_scan() {
        let source = "<html>\n@* @route a/b *@\n";
        assert_eq!(RouteDirectiveScanner::new().scan_str(source), scan(source));
    }
}
