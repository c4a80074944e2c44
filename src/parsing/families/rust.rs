//! Rust family behavior (spec §4.4).

use crate::parsing::behavior::{find_identifier_child, node_text, ImportForm, LanguageBehavior};
use crate::types::EdgeKind;
use tree_sitter::Node;

pub struct RustBehavior;

impl LanguageBehavior for RustBehavior {
    fn class_node_kinds(&self) -> &'static [&'static str] {
        &["struct_item", "trait_item", "enum_item"]
    }

    fn function_node_kinds(&self) -> &'static [&'static str] {
        &["function_item"]
    }

    fn method_node_kinds(&self) -> &'static [&'static str] {
        // Same grammar node as a free function; pass-1 distinguishes a
        // method from a function by lexical nesting inside an `impl_item`.
        &["function_item"]
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["use_declaration"]
    }

    fn call_node_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str> {
        let field = node.child_by_field_name("name")?;
        node_text(field, source)
    }

    fn supertype_names<'a>(&self, class_node: Node<'a>, source: &'a str) -> Vec<(EdgeKind, &'a str)> {
        // `trait Sub: Super1 + Super2` — supertraits appear in a
        // `trait_bounds` child.
        let mut names = Vec::new();
        if class_node.kind() != "trait_item" {
            return names;
        }
        let mut cursor = class_node.walk();
        for child in class_node.children(&mut cursor) {
            if child.kind() == "trait_bounds" {
                let mut inner = child.walk();
                for bound in child.children(&mut inner) {
                    if let Some(name) = find_identifier_child(bound, source).or_else(|| {
                        if bound.kind() == "type_identifier" {
                            node_text(bound, source)
                        } else {
                            None
                        }
                    }) {
                        names.push((EdgeKind::Inherits, name));
                    }
                }
            }
        }
        names
    }

    fn is_constructor(&self, method_name: &str, _enclosing_class_name: Option<&str>) -> bool {
        method_name == "new"
    }

    fn parse_import(&self, node: Node<'_>, source: &str) -> Vec<ImportForm> {
        let Some(text) = node_text(node, source) else {
            return Vec::new();
        };
        let body = text
            .trim_start_matches("pub")
            .trim()
            .trim_start_matches("use")
            .trim()
            .trim_end_matches(';')
            .trim();
        parse_use_tree(body, "")
    }
}

/// Recursively expands a `use` tree (`a::b::{c, d as e, f::*}`) into import
/// forms. Not a full grammar walk over the parsed tree (tree-sitter-rust's
/// `use_declaration` nests `scoped_use_list`/`use_list`/`use_as_clause`),
/// but operating on source text keeps this tractable while covering the
/// shapes spec.md's scenarios exercise.
fn parse_use_tree(body: &str, prefix: &str) -> Vec<ImportForm> {
    if let Some(brace) = body.find('{') {
        let head = &body[..brace];
        let path_prefix = join_path(prefix, head.trim().trim_end_matches("::"));
        let inner = &body[brace + 1..body.rfind('}').unwrap_or(body.len())];
        return split_top_level(inner)
            .into_iter()
            .flat_map(|part| parse_use_tree(part.trim(), &path_prefix))
            .collect();
    }

    if body.ends_with("*") {
        let module = join_path(prefix, body.trim_end_matches("::*").trim());
        return vec![ImportForm {
            source_module: module.clone(),
            imported_name: None,
            local_alias: module.rsplit("::").next().unwrap_or(&module).to_string(),
            is_wildcard: true,
        }];
    }

    let (path, alias) = match body.split_once(" as ") {
        Some((p, a)) => (p.trim(), a.trim()),
        None => (body, ""),
    };
    let full = join_path(prefix, path);
    let (module, name) = match full.rsplit_once("::") {
        Some((m, n)) => (m.to_string(), n.to_string()),
        None => (String::new(), full.clone()),
    };
    let alias = if alias.is_empty() {
        name.clone()
    } else {
        alias.to_string()
    };
    vec![ImportForm {
        source_module: module,
        imported_name: Some(name),
        local_alias: alias,
        is_wildcard: false,
    }]
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else if segment.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}::{segment}")
    }
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_use_produces_one_form() {
        let forms = parse_use_tree("std::collections::HashMap", "");
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].source_module, "std::collections");
        assert_eq!(forms[0].imported_name.as_deref(), Some("HashMap"));
        assert_eq!(forms[0].local_alias, "HashMap");
    }

    #[test]
    fn aliased_use_sets_local_alias() {
        let forms = parse_use_tree("std::io::Result as IoResult", "");
        assert_eq!(forms[0].local_alias, "IoResult");
        assert_eq!(forms[0].imported_name.as_deref(), Some("Result"));
    }

    #[test]
    fn grouped_use_expands_each_member() {
        let forms = parse_use_tree("std::{fs, io::Write}", "");
        assert_eq!(forms.len(), 2);
        assert!(forms.iter().any(|f| f.imported_name.as_deref() == Some("fs")));
        assert!(forms
            .iter()
            .any(|f| f.imported_name.as_deref() == Some("Write") && f.source_module == "std::io"));
    }

    #[test]
    fn wildcard_use_is_flagged() {
        let forms = parse_use_tree("crate::prelude::*", "");
        assert!(forms[0].is_wildcard);
        assert_eq!(forms[0].source_module, "crate::prelude");
    }

    #[test]
    fn is_constructor_matches_new() {
        let behavior = RustBehavior;
        assert!(behavior.is_constructor("new", Some("Widget")));
        assert!(!behavior.is_constructor("build", Some("Widget")));
    }
}
