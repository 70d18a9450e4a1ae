//! Generated unit emission.
//!
//! Each renderable template becomes one public module holding a unit struct
//! with a `render` function. The unit is built as a token stream and returned
//! as source text; downstream tooling re-parses it to discover the type.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::naming;
use crate::syntax::{Segment, SyntaxTree};

/// Emits the generated unit for `tree` as Rust source text.
pub(crate) fn generate(logical_path: &str, tree: &SyntaxTree) -> String {
    let module = Ident::new(&naming::module_name(logical_path), Span::call_site());
    let ty = Ident::new(&naming::type_name(logical_path), Span::call_site());

    let statements = tree.segments.iter().map(render_statement);
    let layout = match &tree.layout {
        Some(name) => quote!(::core::option::Option::Some(#name)),
        None => quote!(::core::option::Option::None),
    };

    let tokens = quote! {
        pub mod #module {
            pub struct #ty;

            impl #ty {
                pub const SOURCE_PATH: &'static str = #logical_path;
                pub const LAYOUT: ::core::option::Option<&'static str> = #layout;

                #[allow(unused_variables)]
                pub fn render(
                    out: &mut ::std::string::String,
                    values: &dyn ::core::ops::Fn(&str) -> ::core::option::Option<::std::string::String>,
                ) {
                    #(#statements)*
                }
            }
        }
    };

    tokens.to_string()
}

fn render_statement(segment: &Segment) -> TokenStream {
    match segment {
        Segment::Literal(text) => quote! {
            out.push_str(#text);
        },
        Segment::Expression { key } => quote! {
            if let ::core::option::Option::Some(value) = values(#key) {
                out.push_str(&value);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::scan;

    fn parse_unit(source: &str) -> syn::File {
        syn::parse_file(source).unwrap()
    }

    #[test]
    fn test_generated_unit_is_valid_rust() {
        let tree = scan("@layout main\n<h1>@{title}</h1>\n");
        let code = generate("views/home/index.tmpl", &tree);
        let file = parse_unit(&code);

        assert_eq!(file.items.len(), 1);
        let syn::Item::Mod(module) = &file.items[0] else {
            panic!("expected a module, got {:?}", file.items[0]);
        };
        assert_eq!(module.ident, "views_home_index");
    }

    #[test]
    fn test_generated_unit_embeds_literals_and_keys() {
        let tree = scan("<p>\"quoted\" @{user.name}</p>");
        let code = generate("a.tmpl", &tree);
        assert!(code.contains("pub struct A"));
        assert!(code.contains(r#""user.name""#));
        assert!(code.contains(r#"\"quoted\""#));
        parse_unit(&code);
    }

    #[test]
    fn test_generated_unit_records_layout() {
        let tree = scan("@layout shared/main\nbody");
        let code = generate("page.tmpl", &tree);
        assert!(code.contains(r#"Some ("shared/main")"#));
    }

    #[test]
    fn test_keyword_paths_still_parse() {
        let tree = scan("x");
        parse_unit(&generate("type/self.tmpl", &tree));
        parse_unit(&generate("mod.tmpl", &tree));
    }
}
