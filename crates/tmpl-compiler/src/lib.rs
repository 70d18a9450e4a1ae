//! Template discovery, translation and cataloguing.
//!
//! This crate is the pre-compilation pipeline of the tmpl workspace. It walks
//! a tree of template files, translates each one with a
//! [`TemplateParser`](tmpl_parser::TemplateParser), gives every generated
//! unit a unique type name, fingerprints the sources and returns a
//! [`TemplateCatalog`](tmpl_core::TemplateCatalog) plus diagnostics.
//!
//! # Overview
//!
//! The main entry point is [`TemplateCatalogBuilder`], which combines:
//!
//! - [`TemplateWalker`]: sorted, depth-first template discovery over a [`FileTree`]
//! - [`RouteDirectiveScanner`]: `@route` extraction from the leading lines
//! - [`CodeUnitRegistry`]: type naming and collision handling in a [`CompilationContext`]
//! - [`fingerprint`]: SHA-256 content hashes
//! - [`BuildStats`]: atomic statistics for progress tracking
//!
//! # Example
//!
//! ```
//! use tmpl_compiler::{emit, MemoryFileTree, TemplateCatalogBuilder};
//!
//! let tree = MemoryFileTree::new()
//!     .with_file("views/home/index.tmpl", "@route index\n<h1>Hi</h1>")
//!     .with_file("views/_partial.tmpl", "<nav>@{ oops</nav>")
//!     .with_file("notes.txt", "ignored");
//!
//! let output = TemplateCatalogBuilder::default().build(&tree)?;
//!
//! assert_eq!(output.catalog.len(), 2);
//! for diagnostic in &output.diagnostics {
//!     println!("{diagnostic}");
//! }
//!
//! // One Rust source file with every generated unit and the catalog module.
//! let source = emit::render_source(&output.catalog, &output.context);
//! assert!(source.contains("template_catalog"));
//! # Ok::<(), tmpl_compiler::BuildError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! TemplateCatalogBuilder (main entry point)
//!     │
//!     ├── TemplateWalker (collect templates)
//!     │       │
//!     │       └── FileTree (PhysicalFileTree | MemoryFileTree)
//!     │
//!     ├── per template (rayon in parallel mode)
//!     │       ├── RouteDirectiveScanner
//!     │       ├── TemplateParser
//!     │       └── fingerprint
//!     │
//!     ├── CodeUnitRegistry (sequential, traversal order)
//!     │
//!     └── BuildStats (atomic counters)
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod builder;
pub mod emit;
mod error;
mod file_tree;
pub mod fingerprint;
mod registry;
mod route;
mod staleness;
mod stats;
mod walker;

pub use builder::{BuildOutput, TemplateCatalogBuilder};
pub use error::BuildError;
pub use file_tree::{FileEntry, FileTree, MemoryFileTree, PhysicalFileTree};
pub use registry::{derive_type_name, CodeUnit, CodeUnitRegistry, CompilationContext};
pub use route::{route_from_line, RouteDirectiveScanner, MAX_SCANNED_LINES, ROUTE_MARKER};
pub use staleness::{check_staleness, Staleness, StalenessEntry, StalenessReport};
pub use stats::{BuildStats, StatsSnapshot};
pub use walker::{RelativeFileInfo, TemplateWalker};
