//! Template translator producing generated Rust code units.
//!
//! This crate turns one template source into one self-contained Rust source
//! unit. It knows nothing about directories, catalogs or compilation; the
//! pre-compilation pipeline in `tmpl-compiler` drives it through the
//! [`TemplateParser`] trait.
//!
//! # Overview
//!
//! - [`TemplateParser`]: the translator interface
//! - [`MarkupParser`]: the default implementation
//! - [`GeneratedCodeResult`]: generated code plus per-template errors
//!
//! # Example
//!
//! ```
//! use tmpl_parser::{MarkupParser, TemplateParser};
//!
//! let parser = MarkupParser::new();
//! let mut source: &[u8] = b"@route home\n<p>Hello, @{user.name}!</p>\n";
//! let result = parser.parse(&mut source, "views/home/index.tmpl")?;
//!
//! let code = result.generated_code.expect("template has content");
//! assert!(code.contains("views_home_index"));
//! # Ok::<(), tmpl_parser::ParseError>(())
//! ```
//!
//! # Generated Units
//!
//! ```text
//! pub mod views_home_index {
//!     pub struct Index;
//!     impl Index {
//!         pub const SOURCE_PATH: &'static str = "views/home/index.tmpl";
//!         pub const LAYOUT: Option<&'static str> = None;
//!         pub fn render(out: &mut String, values: &dyn Fn(&str) -> Option<String>) { ... }
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod codegen;
mod error;
mod naming;
mod parser;
mod syntax;

pub use error::{ParseError, TemplateError};
pub use parser::{GeneratedCodeResult, MarkupParser, TemplateParser};
