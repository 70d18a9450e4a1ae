//! Template syntax scanning.
//!
//! Splits template source into literal markup and interpolations, consumes
//! comments and line directives, and collects [`TemplateError`]s without
//! stopping. Scanning always runs to the end of the input so that one bad
//! construct does not hide the rest of the template.
//!
//! | Construct | Meaning |
//! |-----------|---------|
//! | `@{ key }` | interpolate `key` (single line) |
//! | `@@` | literal `@` |
//! | `@* ... *@` | comment, may span lines |
//! | `@route value` | routing hint (line directive) |
//! | `@layout name` | enclosing layout (line directive) |

use smallvec::SmallVec;
use tmpl_core::SourceLocation;

use crate::error::TemplateError;

/// One piece of template output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Markup emitted verbatim.
    Literal(String),
    /// A value looked up at render time.
    Expression {
        /// Lookup key, trimmed.
        key: String,
    },
}

/// Result of scanning one template.
#[derive(Debug, Default)]
pub(crate) struct SyntaxTree {
    pub(crate) segments: Vec<Segment>,
    pub(crate) layout: Option<String>,
    pub(crate) errors: SmallVec<[TemplateError; 4]>,
}

impl SyntaxTree {
    /// Whether anything besides whitespace would be rendered.
    pub(crate) fn has_renderable_content(&self) -> bool {
        self.segments.iter().any(|segment| match segment {
            Segment::Literal(text) => !text.trim().is_empty(),
            Segment::Expression { .. } => true,
        })
    }
}

/// Scans template source into a [`SyntaxTree`].
pub(crate) fn scan(source: &str) -> SyntaxTree {
    let mut scanner = Scanner::new(source);
    scanner.run();
    scanner.finish()
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    /// Only whitespace has been emitted since the last newline.
    at_line_start: bool,
    /// Length of `literal` when the current line began.
    line_indent_start: usize,
    last_text_char: Option<char>,
    literal: String,
    tree: SyntaxTree,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            line_indent_start: 0,
            last_text_char: None,
            literal: String::new(),
            tree: SyntaxTree::default(),
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '@' {
                self.scan_transition();
            } else {
                self.bump();
                self.push_text(c);
            }
        }
    }

    fn finish(mut self) -> SyntaxTree {
        self.flush_literal();
        self.tree
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    const fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn error(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.tree.errors.push(TemplateError::new(message, location));
    }

    fn push_text(&mut self, c: char) {
        self.literal.push(c);
        self.last_text_char = Some(c);
        if c == '\n' {
            self.at_line_start = true;
            self.line_indent_start = self.literal.len();
        } else if !c.is_whitespace() {
            self.at_line_start = false;
        }
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            let text = std::mem::take(&mut self.literal);
            self.tree.segments.push(Segment::Literal(text));
        }
        self.line_indent_start = 0;
    }

    fn scan_transition(&mut self) {
        let start = self.location();
        match self.peek(1) {
            Some('@') => {
                self.bump();
                self.bump();
                self.push_text('@');
            }
            Some('{') => self.scan_expression(start),
            Some('*') => self.scan_comment(start),
            Some(c) if self.at_line_start && c.is_ascii_alphabetic() => {
                self.scan_directive(start);
            }
            next => {
                self.bump();
                // `name@host` reads as an address, not a transition.
                let follows_word = self.last_text_char.is_some_and(char::is_alphanumeric);
                if !follows_word {
                    let message = match next {
                        Some(c) => format!(
                            "unexpected character '{}' after '@' (write '@@' for a literal '@')",
                            c.escape_debug()
                        ),
                        None => "unexpected end of template after '@'".to_owned(),
                    };
                    self.error(message, start);
                }
                self.push_text('@');
            }
        }
    }

    fn scan_expression(&mut self, start: SourceLocation) {
        self.bump();
        self.bump();

        let mut len = 0;
        let closed = loop {
            match self.peek(len) {
                Some('}') => break true,
                Some('\n') | None => break false,
                Some(_) => len += 1,
            }
        };

        if !closed {
            self.error("unterminated expression, expected '}'", start);
            self.push_text('@');
            self.push_text('{');
            return;
        }

        let raw: String = self.chars[self.pos..self.pos + len].iter().collect();
        for _ in 0..=len {
            self.bump();
        }

        let key = raw.trim();
        if key.is_empty() {
            self.error("empty expression", start);
        } else if !key.chars().all(is_key_char) {
            self.error(format!("invalid expression key '{key}'"), start);
        } else {
            self.flush_literal();
            self.tree.segments.push(Segment::Expression {
                key: key.to_owned(),
            });
            self.at_line_start = false;
            self.last_text_char = None;
        }
    }

    fn scan_comment(&mut self, start: SourceLocation) {
        self.bump();
        self.bump();
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some('*'), Some('@')) => {
                    self.bump();
                    self.bump();
                    return;
                }
                (Some(_), _) => {
                    self.bump();
                }
                (None, _) => {
                    self.error("unterminated comment, expected '*@'", start);
                    return;
                }
            }
        }
    }

    fn scan_directive(&mut self, start: SourceLocation) {
        self.bump();

        let mut name = String::new();
        while let Some(c) = self.peek(0).filter(char::is_ascii_alphabetic) {
            name.push(c);
            self.bump();
        }

        let mut argument = String::new();
        while let Some(c) = self.peek(0).filter(|c| *c != '\n') {
            argument.push(c);
            self.bump();
        }
        if self.peek(0) == Some('\n') {
            self.bump();
        }

        // Directive lines produce no output, including their indentation.
        self.literal.truncate(self.line_indent_start);
        self.at_line_start = true;

        if !argument.is_empty() && !argument.starts_with(char::is_whitespace) {
            self.error(format!("expected whitespace after '@{name}'"), start);
            return;
        }
        let argument = argument.trim();

        match name.as_str() {
            "route" => {
                if argument.is_empty() {
                    self.error("'@route' requires a value", start);
                }
            }
            "layout" => {
                if argument.is_empty() {
                    self.error("'@layout' requires a template name", start);
                } else if self.tree.layout.is_some() {
                    self.error("duplicate '@layout' directive", start);
                } else {
                    self.tree.layout = Some(argument.to_owned());
                }
            }
            other => self.error(format!("unknown directive '@{other}'"), start),
        }
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}
