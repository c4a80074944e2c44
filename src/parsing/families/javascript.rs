//! JavaScript/TypeScript family behavior (spec §4.4, §4.6).
//!
//! TypeScript's grammar is a superset of JavaScript's (interfaces, type
//! aliases); a single implementation with an `is_typescript` flag avoids
//! duplicating every other shape (§9 design note).

use crate::parsing::behavior::{node_text, ImportForm, LanguageBehavior};
use crate::types::EdgeKind;
use tree_sitter::Node;

pub struct JavaScriptBehavior {
    is_typescript: bool,
}

impl JavaScriptBehavior {
    pub fn javascript() -> Self {
        Self { is_typescript: false }
    }

    pub fn typescript() -> Self {
        Self { is_typescript: true }
    }
}

impl LanguageBehavior for JavaScriptBehavior {
    fn class_node_kinds(&self) -> &'static [&'static str] {
        if self.is_typescript {
            &["class_declaration", "interface_declaration"]
        } else {
            &["class_declaration"]
        }
    }

    fn function_node_kinds(&self) -> &'static [&'static str] {
        &["function_declaration", "generator_function_declaration"]
    }

    fn method_node_kinds(&self) -> &'static [&'static str] {
        &["method_definition"]
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["import_statement", "export_statement"]
    }

    fn call_node_kinds(&self) -> &'static [&'static str] {
        &["call_expression", "new_expression"]
    }

    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str> {
        let field = node.child_by_field_name("name")?;
        node_text(field, source)
    }

    fn supertype_names<'a>(&self, class_node: Node<'a>, source: &'a str) -> Vec<(EdgeKind, &'a str)> {
        let mut names = Vec::new();
        let Some(heritage) = class_node.child_by_field_name("heritage") else {
            // fall back: scan children for a class_heritage/extends_clause
            let mut cursor = class_node.walk();
            for child in class_node.children(&mut cursor) {
                if matches!(child.kind(), "class_heritage") {
                    collect_heritage_identifiers(child, source, EdgeKind::Inherits, &mut names);
                }
            }
            return names;
        };
        collect_heritage_identifiers(heritage, source, EdgeKind::Inherits, &mut names);
        names
    }

    fn is_constructor(&self, method_name: &str, _enclosing_class_name: Option<&str>) -> bool {
        method_name == "constructor"
    }

    fn parse_import(&self, node: Node<'_>, source: &str) -> Vec<ImportForm> {
        match node.kind() {
            "import_statement" => parse_import_statement(node, source),
            "export_statement" => parse_export_statement(node, source),
            _ => Vec::new(),
        }
    }
}

/// TypeScript's `class_heritage` can carry both an `extends_clause` and an
/// `implements_clause` as distinct children; plain JS only ever has the
/// former. `current` is the tag in effect for whatever clause we're inside,
/// switched when a clause boundary is crossed so identifiers nested deeper
/// (generic type arguments, qualified names) still inherit the right tag.
fn collect_heritage_identifiers<'a>(
    node: Node<'a>,
    source: &'a str,
    current: EdgeKind,
    out: &mut Vec<(EdgeKind, &'a str)>,
) {
    let tag = match node.kind() {
        "extends_clause" => EdgeKind::Inherits,
        "implements_clause" => EdgeKind::Implements,
        _ => current,
    };
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" | "type_identifier" => {
                if let Some(text) = node_text(child, source) {
                    out.push((tag, text));
                }
            }
            _ => collect_heritage_identifiers(child, source, tag, out),
        }
    }
}

/// `const { a, b: c } = require('./lib')` and `const lib = require('./lib')`
/// (spec §8 Testable Property 7, scenario S5). `parse_import` only sees
/// ES-module `import`/`export` syntax; CommonJS's `require()` is an
/// ordinary call expression, so it's recognized the same way Lua's
/// `require` and GDScript's `preload` are — by inspecting the call site and
/// its enclosing `variable_declarator` rather than a dedicated import node.
pub fn commonjs_require_targets(call: Node<'_>, source: &str) -> Vec<ImportForm> {
    let Some(func) = call.child_by_field_name("function") else {
        return Vec::new();
    };
    if node_text(func, source) != Some("require") {
        return Vec::new();
    }
    let Some(args) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut module = None;
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.kind() == "string" {
            module = node_text(child, source).map(|s| s.trim_matches(|c| c == '"' || c == '\'').to_string());
            break;
        }
    }
    let Some(module) = module else {
        return Vec::new();
    };

    let Some(declarator) = call.parent().filter(|p| p.kind() == "variable_declarator") else {
        return Vec::new();
    };
    let Some(pattern) = declarator.child_by_field_name("name") else {
        return Vec::new();
    };

    match pattern.kind() {
        "object_pattern" => {
            let mut forms = Vec::new();
            let mut cursor = pattern.walk();
            for prop in pattern.children(&mut cursor) {
                match prop.kind() {
                    "shorthand_property_identifier_pattern" => {
                        if let Some(name) = node_text(prop, source) {
                            forms.push(ImportForm {
                                source_module: module.clone(),
                                imported_name: Some(name.to_string()),
                                local_alias: name.to_string(),
                                is_wildcard: false,
                            });
                        }
                    }
                    "pair_pattern" => {
                        let key = prop.child_by_field_name("key").and_then(|n| node_text(n, source));
                        let value = prop.child_by_field_name("value").and_then(|n| node_text(n, source));
                        if let (Some(key), Some(value)) = (key, value) {
                            forms.push(ImportForm {
                                source_module: module.clone(),
                                imported_name: Some(key.to_string()),
                                local_alias: value.to_string(),
                                is_wildcard: false,
                            });
                        }
                    }
                    _ => {}
                }
            }
            forms
        }
        "identifier" => {
            let Some(alias) = node_text(pattern, source) else {
                return Vec::new();
            };
            vec![ImportForm {
                source_module: module,
                imported_name: None,
                local_alias: alias.to_string(),
                is_wildcard: true,
            }]
        }
        _ => Vec::new(),
    }
}

fn source_of(node: Node<'_>, source: &str) -> String {
    node.child_by_field_name("source")
        .and_then(|n| node_text(n, source))
        .map(|s| s.trim_matches(|c| c == '\'' || c == '"').to_string())
        .unwrap_or_default()
}

/// `import a from './x'`, `import {a, b as c} from './x'`, `import * as ns
/// from './x'`, `import './side-effect'`.
fn parse_import_statement(node: Node<'_>, source: &str) -> Vec<ImportForm> {
    let module = source_of(node, source);
    let mut forms = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if let Some(text) = node_text(child, source) {
                    forms.push(ImportForm {
                        source_module: module.clone(),
                        imported_name: Some("default".to_string()),
                        local_alias: text.to_string(),
                        is_wildcard: false,
                    });
                }
            }
            "namespace_import" => {
                if let Some(alias) = find_last_identifier(child, source) {
                    forms.push(ImportForm {
                        source_module: module.clone(),
                        imported_name: None,
                        local_alias: alias.to_string(),
                        is_wildcard: true,
                    });
                }
            }
            "named_imports" => {
                forms.extend(parse_named_clause(child, source, &module));
            }
            _ => {}
        }
    }
    forms
}

/// `export {name}`, `export {name as alias}`, and the re-export form
/// `export {name as alias} from './other'`. The re-export direction is the
/// bug class spec.md's scenarios call out: the alias is *local* to this
/// module, so the import mapping is `alias -> other.name`, never
/// `name -> other.alias` (§4.5).
fn parse_export_statement(node: Node<'_>, source: &str) -> Vec<ImportForm> {
    let Some(module_node) = node.child_by_field_name("source") else {
        return Vec::new();
    };
    let module = node_text(module_node, source)
        .map(|s| s.trim_matches(|c| c == '\'' || c == '"').to_string())
        .unwrap_or_default();

    let mut forms = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "export_clause" {
            let mut inner = child.walk();
            for spec in child.children(&mut inner) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let name = spec
                    .child_by_field_name("name")
                    .and_then(|n| node_text(n, source))
                    .unwrap_or_default();
                let alias = spec
                    .child_by_field_name("alias")
                    .and_then(|n| node_text(n, source))
                    .unwrap_or(name);
                forms.push(ImportForm {
                    source_module: module.clone(),
                    imported_name: Some(name.to_string()),
                    local_alias: alias.to_string(),
                    is_wildcard: false,
                });
            }
        }
    }
    forms
}

fn parse_named_clause(node: Node<'_>, source: &str, module: &str) -> Vec<ImportForm> {
    let mut forms = Vec::new();
    let mut cursor = node.walk();
    for spec in node.children(&mut cursor) {
        if spec.kind() != "import_specifier" {
            continue;
        }
        let name = spec
            .child_by_field_name("name")
            .and_then(|n| node_text(n, source))
            .unwrap_or_default();
        let alias = spec
            .child_by_field_name("alias")
            .and_then(|n| node_text(n, source))
            .unwrap_or(name);
        forms.push(ImportForm {
            source_module: module.to_string(),
            imported_name: Some(name.to_string()),
            local_alias: alias.to_string(),
            is_wildcard: false,
        });
    }
    forms
}

fn find_last_identifier<'a>(node: Node<'a>, source: &'a str) -> Option<&'a str> {
    let mut cursor = node.walk();
    let mut last = None;
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            last = node_text(child, source);
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_name_is_constructor() {
        let behavior = JavaScriptBehavior::javascript();
        assert!(behavior.is_constructor("constructor", Some("Widget")));
        assert!(!behavior.is_constructor("build", Some("Widget")));
    }

    #[test]
    fn typescript_adds_interface_as_class_kind() {
        let js = JavaScriptBehavior::javascript();
        let ts = JavaScriptBehavior::typescript();
        assert!(!js.class_node_kinds().contains(&"interface_declaration"));
        assert!(ts.class_node_kinds().contains(&"interface_declaration"));
    }
}
