//! GDScript family behavior (spec §4.4).
//!
//! A GDScript file is itself an implicit class (`extends` names its
//! supertype), with `class_definition` used only for nested inner classes.
//! There is no import statement; cross-file references go through
//! `preload("res://...")` / `load(...)` calls, which — like Lua's
//! `require` — are recognized at the call-expression level rather than as
//! a dedicated import node (§4.5).

use crate::parsing::behavior::{node_text, ImportForm, LanguageBehavior};
use crate::types::EdgeKind;
use tree_sitter::Node;

pub struct GdScriptBehavior;

impl LanguageBehavior for GdScriptBehavior {
    fn class_node_kinds(&self) -> &'static [&'static str] {
        &["class_definition"]
    }

    fn function_node_kinds(&self) -> &'static [&'static str] {
        &["function_definition"]
    }

    fn method_node_kinds(&self) -> &'static [&'static str] {
        &["function_definition"]
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    fn call_node_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str> {
        let field = node.child_by_field_name("name")?;
        node_text(field, source)
    }

    fn supertype_names<'a>(&self, class_node: Node<'a>, source: &'a str) -> Vec<(EdgeKind, &'a str)> {
        // file-level `extends Base` is a sibling statement, not a header
        // field, so look at the enclosing source_file's direct children.
        let Some(parent) = class_node.parent() else {
            return Vec::new();
        };
        let mut names = Vec::new();
        let mut cursor = parent.walk();
        for child in parent.children(&mut cursor) {
            if child.kind() == "extends_statement" {
                if let Some(name) = child.child_by_field_name("name") {
                    if let Some(text) = node_text(name, source) {
                        names.push((EdgeKind::Inherits, text));
                    }
                }
            }
        }
        names
    }

    fn is_constructor(&self, method_name: &str, _enclosing_class_name: Option<&str>) -> bool {
        method_name == "_init"
    }

    fn parse_import(&self, _node: Node<'_>, _source: &str) -> Vec<ImportForm> {
        Vec::new()
    }
}

/// Recognizes `preload("res://path.gd")` / `load("res://path.gd")` as an
/// import-equivalent call (§4.5), mirroring `lua::require_target`.
pub fn preload_target(call: Node<'_>, source: &str) -> Vec<ImportForm> {
    let Some(func) = call.child_by_field_name("name").or_else(|| call.child(0)) else {
        return Vec::new();
    };
    let Some(name) = node_text(func, source) else {
        return Vec::new();
    };
    if name != "preload" && name != "load" {
        return Vec::new();
    }
    let Some(args) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.kind() == "string" {
            let Some(text) = node_text(child, source) else {
                continue;
            };
            let text = text.trim_matches('"');
            let local = text
                .rsplit('/')
                .next()
                .unwrap_or(text)
                .trim_end_matches(".gd");
            return vec![ImportForm {
                source_module: text.to_string(),
                imported_name: None,
                local_alias: local.to_string(),
                is_wildcard: true,
            }];
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_constructor_matches_init() {
        let behavior = GdScriptBehavior;
        assert!(behavior.is_constructor("_init", None));
    }
}
