//! Generated unit registration and type naming.
//!
//! This module provides [`CompilationContext`], the accumulating set of
//! generated code units for one build, and [`CodeUnitRegistry`], which adds
//! units to it and derives each unit's full type name.
//!
//! # Type Names
//!
//! A unit's main type is the first public `struct` or `enum` found by a
//! depth-first search through its items, descending into public inline
//! modules. The full type name is the module path joined with `::`:
//!
//! ```text
//! pub mod views_home_index { pub struct Index; }   =>   views_home_index::Index
//! ```
//!
//! A unit without a public type is not registered.
//!
//! # Collisions
//!
//! All units end up in one source file, so top-level item names must be
//! unique across the context. A top-level name that is already taken is
//! renamed with a numeric suffix (`_2`, `_3`, ...) and every occurrence of
//! it inside the unit is rewritten. Units are registered in traversal order,
//! which makes the chosen suffixes deterministic.

use std::fmt::Write as _;

use proc_macro2::Ident;
use quote::ToTokens;
use rustc_hash::FxHashSet;
use syn::ext::IdentExt;
use syn::visit_mut::{self, VisitMut};
use syn::{Item, Visibility};
use tracing::debug;

use crate::error::BuildError;

/// One registered generated unit.
#[derive(Debug, Clone)]
pub struct CodeUnit {
    relative_path: String,
    full_type_name: String,
    file: syn::File,
}

impl CodeUnit {
    /// Relative path of the template that produced the unit.
    #[inline]
    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// The unit's full type name, after collision renaming.
    #[inline]
    #[must_use]
    pub fn full_type_name(&self) -> &str {
        &self.full_type_name
    }

    /// The unit's syntax tree, after collision renaming.
    #[inline]
    #[must_use]
    pub fn syntax(&self) -> &syn::File {
        &self.file
    }

    /// Renders the unit as Rust source.
    #[must_use]
    pub fn to_source(&self) -> String {
        self.file.to_token_stream().to_string()
    }
}

/// The set of generated units accumulated during one build.
///
/// # Examples
///
/// ```
/// use tmpl_compiler::{CodeUnitRegistry, CompilationContext};
///
/// let registry = CodeUnitRegistry::new();
/// let mut context = CompilationContext::new();
///
/// let first = registry.register(&mut context, "a/page.tmpl", "pub mod page { pub struct Page; }")?;
/// let second = registry.register(&mut context, "b/page.tmpl", "pub mod page { pub struct Page; }")?;
///
/// assert_eq!(first.as_deref(), Some("page::Page"));
/// assert_eq!(second.as_deref(), Some("page_2::Page"));
/// assert_eq!(context.len(), 2);
/// # Ok::<(), tmpl_compiler::BuildError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompilationContext {
    units: Vec<CodeUnit>,
    /// Top-level item names across all units.
    taken: FxHashSet<String>,
}

impl CompilationContext {
    /// Creates an empty context.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered units.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if no unit has been registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Registered units, in registration order.
    #[inline]
    #[must_use]
    pub fn units(&self) -> &[CodeUnit] {
        &self.units
    }

    /// Returns `true` if a unit with this full type name is registered.
    #[must_use]
    pub fn contains_type(&self, full_type_name: &str) -> bool {
        self.units
            .iter()
            .any(|unit| unit.full_type_name == full_type_name)
    }

    /// Returns `true` if a top-level item called `name` is already present.
    #[must_use]
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Looks up a unit by the relative path of its template.
    #[must_use]
    pub fn unit_for_path(&self, relative_path: &str) -> Option<&CodeUnit> {
        self.units
            .iter()
            .find(|unit| unit.relative_path == relative_path)
    }

    /// Renders every unit into a single Rust source file.
    ///
    /// Each unit is preceded by a comment naming its template.
    #[must_use]
    pub fn to_source(&self) -> String {
        let mut source = String::from("// @generated by tmplc. Do not edit.\n");
        for unit in &self.units {
            // Writing to a String cannot fail.
            let _ = write!(source, "\n// {}\n{}\n", unit.relative_path, unit.to_source());
        }
        source
    }
}

/// Adds generated units to a [`CompilationContext`] and names their types.
///
/// The registry itself is stateless; all accumulated state lives in the
/// context passed to [`register`](Self::register).
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeUnitRegistry {
    _private: (),
}

impl CodeUnitRegistry {
    /// Creates a new registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrates `generated_code` into `context` and returns its full type
    /// name.
    ///
    /// Returns `Ok(None)` without touching the context when the unit has no
    /// public type.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Registry`] if `generated_code` is not valid
    /// Rust.
    pub fn register(
        &self,
        context: &mut CompilationContext,
        relative_path: &str,
        generated_code: &str,
    ) -> Result<Option<String>, BuildError> {
        let mut file = syn::parse_file(generated_code)
            .map_err(|err| BuildError::registry(relative_path, err))?;

        if derive_type_name(&file).is_none() {
            debug!(path = relative_path, "Generated unit has no public type");
            return Ok(None);
        }

        let own_names = top_level_names(&file);
        for name in &own_names {
            if !context.taken.contains(name) {
                continue;
            }
            let replacement = free_name(name, &context.taken, &own_names);
            debug!(
                path = relative_path,
                from = %name,
                to = %replacement,
                "Renaming colliding item"
            );
            rename(&mut file, name, &replacement);
        }

        let Some(full_type_name) = derive_type_name(&file) else {
            return Ok(None);
        };

        context.taken.extend(top_level_names(&file));
        context.units.push(CodeUnit {
            relative_path: relative_path.to_owned(),
            full_type_name: full_type_name.clone(),
            file,
        });

        Ok(Some(full_type_name))
    }
}

/// Derives the full type name of a parsed unit.
///
/// Returns `None` if the unit has no public `struct` or `enum` reachable
/// through public inline modules.
#[must_use]
pub fn derive_type_name(file: &syn::File) -> Option<String> {
    let mut path = Vec::new();
    find_main_type(&file.items, &mut path)
}

fn find_main_type(items: &[Item], path: &mut Vec<String>) -> Option<String> {
    for item in items {
        let found = match item {
            Item::Struct(item) if is_public(&item.vis) => Some(&item.ident),
            Item::Enum(item) if is_public(&item.vis) => Some(&item.ident),
            Item::Mod(item) if is_public(&item.vis) => {
                let Some((_, nested)) = &item.content else {
                    continue;
                };
                path.push(item.ident.unraw().to_string());
                if let Some(name) = find_main_type(nested, path) {
                    return Some(name);
                }
                path.pop();
                None
            }
            _ => None,
        };

        if let Some(ident) = found {
            path.push(ident.unraw().to_string());
            return Some(path.join("::"));
        }
    }
    None
}

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

/// Names of the unit's top-level items, unraw'd, in item order.
fn top_level_names(file: &syn::File) -> Vec<String> {
    let mut names = Vec::new();
    for ident in file.items.iter().filter_map(declared_ident) {
        let name = ident.unraw().to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn declared_ident(item: &Item) -> Option<&Ident> {
    match item {
        Item::Const(item) => Some(&item.ident),
        Item::Enum(item) => Some(&item.ident),
        Item::Fn(item) => Some(&item.sig.ident),
        Item::Mod(item) => Some(&item.ident),
        Item::Static(item) => Some(&item.ident),
        Item::Struct(item) => Some(&item.ident),
        Item::Trait(item) => Some(&item.ident),
        Item::Type(item) => Some(&item.ident),
        Item::Union(item) => Some(&item.ident),
        _ => None,
    }
}

fn declared_ident_mut(item: &mut Item) -> Option<&mut Ident> {
    match item {
        Item::Const(item) => Some(&mut item.ident),
        Item::Enum(item) => Some(&mut item.ident),
        Item::Fn(item) => Some(&mut item.sig.ident),
        Item::Mod(item) => Some(&mut item.ident),
        Item::Static(item) => Some(&mut item.ident),
        Item::Struct(item) => Some(&mut item.ident),
        Item::Trait(item) => Some(&mut item.ident),
        Item::Type(item) => Some(&mut item.ident),
        Item::Union(item) => Some(&mut item.ident),
        _ => None,
    }
}

fn free_name(base: &str, taken: &FxHashSet<String>, own_names: &[String]) -> String {
    (2_u64..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate) && !own_names.contains(candidate))
        .unwrap_or_else(|| format!("{base}_"))
}

/// Rewrites relative paths that start with a renamed top-level item.
///
/// Absolute paths (`::core::option::Option`) name other crates and are left
/// alone. Leading `self`, `super` and `crate` segments are skipped, so
/// `super::page::Page` inside a nested module is rewritten too.
struct PathRenamer<'a> {
    from: &'a str,
    to: &'a str,
}

impl VisitMut for PathRenamer<'_> {
    fn visit_path_mut(&mut self, path: &mut syn::Path) {
        if path.leading_colon.is_none() {
            let head = path
                .segments
                .iter_mut()
                .find(|segment| !is_path_keyword(&segment.ident))
                .filter(|segment| segment.ident.unraw() == self.from);
            if let Some(segment) = head {
                segment.ident = Ident::new(self.to, segment.ident.span());
            }
        }
        visit_mut::visit_path_mut(self, path);
    }
}

fn is_path_keyword(ident: &Ident) -> bool {
    ident == "self" || ident == "super" || ident == "crate"
}

fn rename(file: &mut syn::File, from: &str, to: &str) {
    let declared = file
        .items
        .iter_mut()
        .filter_map(declared_ident_mut)
        .filter(|ident| ident.unraw() == from);
    for ident in declared {
        *ident = Ident::new(to, ident.span());
    }
    PathRenamer { from, to }.visit_file_mut(file);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(context: &mut CompilationContext, path: &str, code: &str) -> Option<String> {
        CodeUnitRegistry::new().register(context, path, code).unwrap()
    }

    #[test]
    fn test_type_name_from_nested_modules() {
        let mut context = CompilationContext::new();
        let name = register(
            &mut context,
            "views/home/index.tmpl",
            "pub mod views { pub mod home { pub struct Index; } }",
        );
        assert_eq!(name.as_deref(), Some("views::home::Index"));
        assert!(context.contains_type("views::home::Index"));
    }

    #[test]
    fn test_first_public_type_wins() {
        let file = syn::parse_file(
            "struct Hidden; mod private { pub struct Inner; } pub enum Shown { A } pub struct Later;",
        )
        .unwrap();
        assert_eq!(derive_type_name(&file).as_deref(), Some("Shown"));
    }

    #[test]
    fn test_search_is_depth_first() {
        let file = syn::parse_file("pub mod a { pub mod b { pub struct Deep; } pub struct Shallow; }")
            .unwrap();
        assert_eq!(derive_type_name(&file).as_deref(), Some("a::b::Deep"));
    }

    #[test]
    fn test_unit_without_public_type_is_not_registered() {
        let mut context = CompilationContext::new();
        assert_eq!(register(&mut context, "a.tmpl", "pub fn render() {}"), None);
        assert_eq!(register(&mut context, "b.tmpl", "mod m { pub struct S; }"), None);
        assert_eq!(register(&mut context, "c.tmpl", ""), None);
        assert!(context.is_empty());
    }

    #[test]
    fn test_malformed_code_is_an_error() {
        let mut context = CompilationContext::new();
        let err = CodeUnitRegistry::new()
            .register(&mut context, "bad.tmpl", "pub struct {")
            .unwrap_err();
        assert!(matches!(err, BuildError::Registry { ref path, .. } if path == "bad.tmpl"));
        assert!(context.is_empty());
    }

    #[test]
    fn test_collisions_get_numeric_suffixes() {
        let code = "pub mod page { pub struct Page; impl Page { pub fn name() -> &'static str { \"p\" } } }";
        let mut context = CompilationContext::new();

        assert_eq!(register(&mut context, "a.tmpl", code).as_deref(), Some("page::Page"));
        assert_eq!(register(&mut context, "b.tmpl", code).as_deref(), Some("page_2::Page"));
        assert_eq!(register(&mut context, "c.tmpl", code).as_deref(), Some("page_3::Page"));

        let renamed = context.unit_for_path("b.tmpl").unwrap().to_source();
        assert!(renamed.contains("pub mod page_2"));
    }

    #[test]
    fn test_top_level_type_collision_rewrites_impls() {
        let code = "pub struct Page; impl Page { pub const X: u8 = 1; }";
        let mut context = CompilationContext::new();
        register(&mut context, "a.tmpl", code);
        assert_eq!(register(&mut context, "b.tmpl", code).as_deref(), Some("Page_2"));

        let source = context.unit_for_path("b.tmpl").unwrap().to_source();
        assert!(source.contains("impl Page_2"));
        syn::parse_file(&context.to_source()).unwrap();
    }

    #[test]
    fn test_collision_keeps_absolute_paths() {
        let code = "pub mod core { pub struct Core; impl Core { \
                    pub const LAYOUT: ::core::option::Option<&'static str> = ::core::option::Option::None; } }";
        let mut context = CompilationContext::new();
        register(&mut context, "core.tmpl", code);
        assert_eq!(register(&mut context, "Core.tmpl", code).as_deref(), Some("core_2::Core"));

        let source = context.unit_for_path("Core.tmpl").unwrap().to_source();
        assert!(source.contains("pub mod core_2"));
        assert!(source.contains(":: core :: option :: Option"));
        assert!(!source.contains("core_2 :: option"));
    }

    #[test]
    fn test_collision_rewrites_relative_and_super_paths() {
        let code = "pub struct Page; pub mod helpers { pub fn make() -> super::Page { super::Page } } \
                    pub fn page() -> Page { Page }";
        let mut context = CompilationContext::new();
        register(&mut context, "a.tmpl", code);
        assert_eq!(register(&mut context, "b.tmpl", code).as_deref(), Some("Page_2"));

        let source = context.unit_for_path("b.tmpl").unwrap().to_source();
        assert!(source.contains("super :: Page_2"));
        assert!(source.contains("-> Page_2 { Page_2 }"));
        assert!(!source.contains("super :: Page {"));
        assert!(source.contains("pub mod helpers_2"));
        assert!(source.contains("pub fn page_2 ()"));
        syn::parse_file(&context.to_source()).unwrap();
    }

    #[test]
    fn test_suffix_skips_names_already_taken() {
        let mut context = CompilationContext::new();
        register(&mut context, "a.tmpl", "pub mod page_2 { pub struct A; }");
        register(&mut context, "b.tmpl", "pub mod page { pub struct B; }");
        let name = register(&mut context, "c.tmpl", "pub mod page { pub struct C; }");
        assert_eq!(name.as_deref(), Some("page_3::C"));
    }

    #[test]
    fn test_distinct_modules_are_untouched() {
        let mut context = CompilationContext::new();
        register(&mut context, "a.tmpl", "pub mod a { pub struct Page; }");
        let name = register(&mut context, "b.tmpl", "pub mod b { pub struct Page; }");
        assert_eq!(name.as_deref(), Some("b::Page"));
    }

    #[test]
    fn test_rendered_context_is_valid_rust() {
        let mut context = CompilationContext::new();
        register(&mut context, "x/a.tmpl", "pub mod a { pub struct A; }");
        register(&mut context, "y/a.tmpl", "pub mod a { pub struct A; }");

        let source = context.to_source();
        assert!(source.contains("// x/a.tmpl"));
        assert!(source.contains("// y/a.tmpl"));
        let file = syn::parse_file(&source).unwrap();
        assert_eq!(file.items.len(), 2);
    }
}
