//! Clojure family behavior (spec §4.4).
//!
//! Clojure's grammar parses every form as an s-expression list; there is no
//! dedicated `function_definition` node kind. `declared_name` instead reads
//! the second symbol of a `(defn name ...)`/`(defn- name ...)` list, and
//! `(ns name ...)` plays the role of a module declaration. There is no
//! class concept in the closed set's sense, so no Class nodes are emitted
//! for Clojure source.

use crate::parsing::behavior::{node_text, ImportForm, LanguageBehavior};
use crate::types::EdgeKind;
use tree_sitter::Node;

pub struct ClojureBehavior;

impl LanguageBehavior for ClojureBehavior {
    fn class_node_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    fn function_node_kinds(&self) -> &'static [&'static str] {
        &["list_lit"]
    }

    fn method_node_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["list_lit"]
    }

    fn call_node_kinds(&self) -> &'static [&'static str] {
        &["list_lit"]
    }

    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str> {
        if !is_defn_form(node, source) {
            return None;
        }
        nth_symbol(node, source, 1)
    }

    fn supertype_names<'a>(&self, _class_node: Node<'a>, _source: &'a str) -> Vec<(EdgeKind, &'a str)> {
        Vec::new()
    }

    fn is_constructor(&self, _method_name: &str, _enclosing_class_name: Option<&str>) -> bool {
        false
    }

    fn parse_import(&self, node: Node<'_>, source: &str) -> Vec<ImportForm> {
        if nth_symbol(node, source, 0) != Some("ns") {
            return Vec::new();
        }
        // `(ns my.app (:require [other.ns :as alias] [third.ns :refer [x]]))`
        let mut forms = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "list_lit" && nth_symbol(child, source, 0) == Some(":require") {
                let mut inner = child.walk();
                for clause in child.children(&mut inner) {
                    if clause.kind() == "vec_lit" {
                        if let Some(form) = parse_require_clause(clause, source) {
                            forms.push(form);
                        }
                    }
                }
            }
        }
        forms
    }
}

fn is_defn_form(node: Node<'_>, source: &str) -> bool {
    matches!(nth_symbol(node, source, 0), Some("defn") | Some("defn-"))
}

fn nth_symbol<'a>(node: Node<'a>, source: &'a str, index: usize) -> Option<&'a str> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == "sym_lit" || c.kind() == "kwd_lit")
        .nth(index)
        .and_then(|n| node_text(n, source))
}

fn parse_require_clause(vec_node: Node<'_>, source: &str) -> Option<ImportForm> {
    let module = nth_symbol(vec_node, source, 0)?.to_string();
    let mut cursor = vec_node.walk();
    let children: Vec<_> = vec_node.children(&mut cursor).collect();
    for window in children.windows(2) {
        if let Some(key) = node_text(window[0], source) {
            if key == ":as" {
                let alias = node_text(window[1], source)?.to_string();
                return Some(ImportForm {
                    source_module: module,
                    imported_name: None,
                    local_alias: alias,
                    is_wildcard: true,
                });
            }
        }
    }
    let local = module.rsplit('.').next().unwrap_or(&module).to_string();
    Some(ImportForm {
        source_module: module,
        imported_name: None,
        local_alias: local,
        is_wildcard: true,
    })
}
