//! Core types, errors, and configuration for the tmpl template pre-compiler.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - Domain types ([`TemplateDescriptor`], [`TemplateCatalog`], [`Diagnostic`],
//!   [`ContentHash`])
//! - Configuration structures ([`Config`], [`BuildConfig`], [`OutputConfig`])
//! - The [`ConfigError`] type for configuration loading and validation

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    normalize_extension, BuildConfig, Config, OutputConfig, DEFAULT_TEMPLATE_EXTENSION,
};
pub use error::ConfigError;
pub use types::{
    ContentHash, Diagnostic, Severity, SourceLocation, TemplateCatalog, TemplateDescriptor,
};
