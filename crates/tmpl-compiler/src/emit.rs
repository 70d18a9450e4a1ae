//! Catalog code unit emission.
//!
//! Renders a [`TemplateCatalog`] as a Rust module so that an application can
//! look templates up at run time without reading the JSON manifest:
//!
//! ```text
//! pub mod template_catalog {
//!     pub struct TemplateEntry { full_type_name, relative_path, last_modified, length, content_hash, route }
//!     pub static ENTRIES: &[TemplateEntry] = &[ ... ];
//!     pub fn find(relative_path: &str) -> Option<&'static TemplateEntry> { ... }
//!     pub fn find_by_type(full_type_name: &str) -> Option<&'static TemplateEntry> { ... }
//! }
//! ```

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use tmpl_core::{TemplateCatalog, TemplateDescriptor};

use crate::registry::CompilationContext;

/// Preferred name of the emitted catalog module.
pub const CATALOG_MODULE: &str = "template_catalog";

/// Renders `catalog` as a code unit.
///
/// Returns `None` for an empty catalog. The module is called
/// [`CATALOG_MODULE`] unless a registered unit already uses that name, in
/// which case a numeric suffix is added.
///
/// # Examples
///
/// ```
/// use tmpl_compiler::{emit, MemoryFileTree, TemplateCatalogBuilder};
///
/// let tree = MemoryFileTree::new().with_file("index.tmpl", "<h1>Hi</h1>");
/// let output = TemplateCatalogBuilder::default().build(&tree)?;
///
/// let unit = emit::catalog_unit(&output.catalog, &output.context).unwrap();
/// assert!(unit.contains("template_catalog"));
/// # Ok::<(), tmpl_compiler::BuildError>(())
/// ```
#[must_use]
pub fn catalog_unit(catalog: &TemplateCatalog, context: &CompilationContext) -> Option<String> {
    if catalog.is_empty() {
        return None;
    }

    let module = Ident::new(&catalog_module_name(context), Span::call_site());
    let entries = catalog.iter().map(entry_tokens);

    let tokens = quote! {
        pub mod #module {
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct TemplateEntry {
                pub full_type_name: &'static str,
                pub relative_path: &'static str,
                pub last_modified: u64,
                pub length: u64,
                pub content_hash: &'static str,
                pub route: ::core::option::Option<&'static str>,
            }

            pub static ENTRIES: &[TemplateEntry] = &[#(#entries),*];

            pub fn find(relative_path: &str) -> ::core::option::Option<&'static TemplateEntry> {
                ENTRIES.iter().find(|entry| entry.relative_path == relative_path)
            }

            pub fn find_by_type(full_type_name: &str) -> ::core::option::Option<&'static TemplateEntry> {
                ENTRIES.iter().find(|entry| entry.full_type_name == full_type_name)
            }
        }
    };

    Some(tokens.to_string())
}

/// Renders the compilation context followed by the catalog unit, if any, as
/// one Rust source file.
#[must_use]
pub fn render_source(catalog: &TemplateCatalog, context: &CompilationContext) -> String {
    let mut source = context.to_source();
    if let Some(unit) = catalog_unit(catalog, context) {
        source.push_str("\n// template catalog\n");
        source.push_str(&unit);
        source.push('\n');
    }
    source
}

fn catalog_module_name(context: &CompilationContext) -> String {
    if !context.is_name_taken(CATALOG_MODULE) {
        return CATALOG_MODULE.to_owned();
    }
    (2_u64..)
        .map(|n| format!("{CATALOG_MODULE}_{n}"))
        .find(|name| !context.is_name_taken(name))
        .unwrap_or_else(|| format!("{CATALOG_MODULE}_"))
}

fn entry_tokens(descriptor: &TemplateDescriptor) -> TokenStream {
    let full_type_name = &descriptor.full_type_name;
    let relative_path = &descriptor.relative_path;
    let last_modified = descriptor.last_modified;
    let length = descriptor.length;
    let content_hash = descriptor.content_hash.to_hex();
    let route = match descriptor.route() {
        Some(route) => quote!(::core::option::Option::Some(#route)),
        None => quote!(::core::option::Option::None),
    };

    quote! {
        TemplateEntry {
            full_type_name: #full_type_name,
            relative_path: #relative_path,
            last_modified: #last_modified,
            length: #length,
            content_hash: #content_hash,
            route: #route,
        }
    }
}
