//! Identifier synthesis for generated units.
//!
//! Template paths become Rust identifiers: the module name is the
//! lowercased path (directories and file stem joined by `_`), the type name
//! is the PascalCase file stem. Every produced name is a valid, non-keyword
//! identifier.

const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Module name for a template at `logical_path`.
///
/// `views/home/index.tmpl` becomes `views_home_index`.
pub(crate) fn module_name(logical_path: &str) -> String {
    let without_extension = strip_extension(logical_path);
    let joined: String = without_extension
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let mut name: String = joined
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "t_");
    }
    finish(name, "template")
}

/// Type name for a template at `logical_path`.
///
/// `views/user-list.tmpl` becomes `UserList`.
pub(crate) fn type_name(logical_path: &str) -> String {
    let without_extension = strip_extension(logical_path);
    let stem = without_extension
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let mut name = String::with_capacity(stem.len());
    for part in stem.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.extend(chars);
        }
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'T');
    }
    finish(name, "Template")
}

fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..file_start + dot],
        _ => path,
    }
}

fn finish(mut name: String, fallback: &str) -> String {
    if name.is_empty() || name.chars().all(|c| c == '_') {
        return fallback.to_owned();
    }
    if KEYWORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name_from_nested_path() {
        assert_eq!(module_name("views/home/index.tmpl"), "views_home_index");
        assert_eq!(module_name("views/_partial.tmpl"), "views__partial");
        assert_eq!(module_name("Views\\Shared\\Nav-Bar.TMPL"), "views_shared_nav_bar");
    }

    #[test]
    fn test_module_name_edge_cases() {
        assert_eq!(module_name("404.tmpl"), "t_404");
        assert_eq!(module_name("type.tmpl"), "type_");
        assert_eq!(module_name("_.tmpl"), "template");
        assert_eq!(module_name(".tmpl"), "_tmpl");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name("views/home/index.tmpl"), "Index");
        assert_eq!(type_name("views/_partial.tmpl"), "Partial");
        assert_eq!(type_name("views/user-list.tmpl"), "UserList");
        assert_eq!(type_name("errors/404.tmpl"), "T404");
        assert_eq!(type_name("self.tmpl"), "Self_");
        assert_eq!(type_name("___.tmpl"), "Template");
    }

    #[test]
    fn test_strip_extension_keeps_dotted_directories() {
        assert_eq!(strip_extension("a.b/c.tmpl"), "a.b/c");
        assert_eq!(strip_extension("a.b/c"), "a.b/c");
        assert_eq!(strip_extension("a.b/.hidden"), "a.b/.hidden");
    }
}
