//! Lua family behavior (spec §4.4).
//!
//! Lua has no class or import grammar of its own: modules are tables
//! returned from a chunk, and `require("mod")` is an ordinary call
//! expression rather than a dedicated import statement. `class_node_kinds`
//! and `import_node_kinds` are therefore empty; a `require` call is instead
//! recognized as an import when the call resolver walks call expressions
//! (§4.5 "some languages encode imports as calls, not statements").

use crate::parsing::behavior::{node_text, ImportForm, LanguageBehavior};
use crate::types::EdgeKind;
use tree_sitter::Node;

pub struct LuaBehavior;

impl LanguageBehavior for LuaBehavior {
    fn class_node_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    fn function_node_kinds(&self) -> &'static [&'static str] {
        &["function_declaration", "local_function"]
    }

    fn method_node_kinds(&self) -> &'static [&'static str] {
        // `function Obj:method(...)` reuses `function_declaration`; the
        // generic walker distinguishes method-vs-function by the presence
        // of a `:` method-index name, not the grammar node kind.
        &["function_declaration"]
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    fn call_node_kinds(&self) -> &'static [&'static str] {
        &["function_call"]
    }

    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str> {
        let field = node.child_by_field_name("name")?;
        node_text(field, source)
    }

    fn supertype_names<'a>(&self, _class_node: Node<'a>, _source: &'a str) -> Vec<(EdgeKind, &'a str)> {
        Vec::new()
    }

    fn is_constructor(&self, method_name: &str, _enclosing_class_name: Option<&str>) -> bool {
        method_name == "new"
    }

    fn parse_import(&self, _node: Node<'_>, _source: &str) -> Vec<ImportForm> {
        Vec::new()
    }
}

/// Recognizes `require("module.path")` / `require "module.path"` calls so
/// the import processor can treat them like a real import statement even
/// though Lua has no import grammar (§4.5).
pub fn require_target(call: Node<'_>, source: &str) -> Vec<ImportForm> {
    let Some(func) = call.child_by_field_name("name").or_else(|| call.child(0)) else {
        return Vec::new();
    };
    if node_text(func, source) != Some("require") {
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
            let text = text.trim_matches(|c| c == '"' || c == '\'');
            return vec![ImportForm {
                source_module: text.to_string(),
                imported_name: None,
                local_alias: text.rsplit('.').next().unwrap_or(text).to_string(),
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
    fn is_constructor_matches_new() {
        let behavior = LuaBehavior;
        assert!(behavior.is_constructor("new", None));
    }
}
