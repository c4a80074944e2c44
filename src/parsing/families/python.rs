//! Python family behavior (spec §4.4, §4.6).

use crate::parsing::behavior::{node_text, ImportForm, LanguageBehavior};
use crate::types::EdgeKind;
use tree_sitter::Node;

pub struct PythonBehavior;

impl LanguageBehavior for PythonBehavior {
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
        &["import_statement", "import_from_statement"]
    }

    fn call_node_kinds(&self) -> &'static [&'static str] {
        &["call"]
    }

    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str> {
        let field = node.child_by_field_name("name")?;
        node_text(field, source)
    }

    fn supertype_names<'a>(&self, class_node: Node<'a>, source: &'a str) -> Vec<(EdgeKind, &'a str)> {
        let Some(superclasses) = class_node.child_by_field_name("superclasses") else {
            return Vec::new();
        };
        let mut names = Vec::new();
        let mut cursor = superclasses.walk();
        for child in superclasses.children(&mut cursor) {
            if matches!(child.kind(), "identifier" | "attribute") {
                if let Some(text) = node_text(child, source) {
                    // keyword args like `metaclass=ABCMeta` aren't supertypes
                    if !text.contains('=') {
                        names.push((EdgeKind::Inherits, text));
                    }
                }
            }
        }
        names
    }

    fn is_constructor(&self, method_name: &str, _enclosing_class_name: Option<&str>) -> bool {
        method_name == "__init__" || method_name == "__new__"
    }

    fn parse_import(&self, node: Node<'_>, source: &str) -> Vec<ImportForm> {
        match node.kind() {
            "import_statement" => parse_plain_import(node, source),
            "import_from_statement" => parse_from_import(node, source),
            _ => Vec::new(),
        }
    }
}

fn parse_plain_import(node: Node<'_>, source: &str) -> Vec<ImportForm> {
    let mut cursor = node.walk();
    let mut forms = Vec::new();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                if let Some(text) = node_text(child, source) {
                    forms.push(ImportForm {
                        source_module: text.to_string(),
                        imported_name: None,
                        local_alias: text.rsplit('.').next().unwrap_or(text).to_string(),
                        is_wildcard: false,
                    });
                }
            }
            "aliased_import" => {
                let module = child
                    .child_by_field_name("name")
                    .and_then(|n| node_text(n, source))
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .and_then(|n| node_text(n, source))
                    .unwrap_or(module);
                forms.push(ImportForm {
                    source_module: module.to_string(),
                    imported_name: None,
                    local_alias: alias.to_string(),
                    is_wildcard: false,
                });
            }
            _ => {}
        }
    }
    forms
}

fn parse_from_import(node: Node<'_>, source: &str) -> Vec<ImportForm> {
    let module_field = node.child_by_field_name("module_name");
    let source_module = module_field
        .and_then(|n| node_text(n, source))
        .unwrap_or("")
        .to_string();

    let mut cursor = node.walk();
    let mut forms = Vec::new();
    let mut saw_names = false;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "wildcard_import" => {
                forms.push(ImportForm {
                    source_module: source_module.clone(),
                    imported_name: None,
                    local_alias: source_module.rsplit('.').next().unwrap_or("").to_string(),
                    is_wildcard: true,
                });
                saw_names = true;
            }
            "dotted_name" if module_field.map(|m| m.id() != child.id()).unwrap_or(true) => {
                if let Some(text) = node_text(child, source) {
                    forms.push(ImportForm {
                        source_module: source_module.clone(),
                        imported_name: Some(text.to_string()),
                        local_alias: text.to_string(),
                        is_wildcard: false,
                    });
                    saw_names = true;
                }
            }
            "aliased_import" => {
                let name = child
                    .child_by_field_name("name")
                    .and_then(|n| node_text(n, source))
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .and_then(|n| node_text(n, source))
                    .unwrap_or(name);
                forms.push(ImportForm {
                    source_module: source_module.clone(),
                    imported_name: Some(name.to_string()),
                    local_alias: alias.to_string(),
                    is_wildcard: false,
                });
                saw_names = true;
            }
            _ => {}
        }
    }
    let _ = saw_names;
    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_constructor_matches_dunder_init() {
        let behavior = PythonBehavior;
        assert!(behavior.is_constructor("__init__", Some("Widget")));
        assert!(!behavior.is_constructor("build", Some("Widget")));
    }
}
