//! Domain types for the tmpl template pre-compiler.
//!
//! # Module Organization
//!
//! - [`content_hash`] - Fixed-size content fingerprints
//! - [`descriptor`] - Compiled template descriptors and the catalog
//! - [`diagnostic`] - Build diagnostics
//! - [`location`] - Positions within template sources
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use tmpl_core::{Diagnostic, TemplateCatalog, TemplateDescriptor};
//! ```

pub mod content_hash;
pub mod descriptor;
pub mod diagnostic;
pub mod location;

pub use content_hash::ContentHash;
pub use descriptor::{TemplateCatalog, TemplateDescriptor};
pub use diagnostic::{Diagnostic, Severity};
pub use location::SourceLocation;
