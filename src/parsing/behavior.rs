//! Per-language behavior (spec §4.4, §4.6): node-type tables, constructor
//! detection, import-form recognition.
//!
//! The reference indexer's `language_behavior.rs` folds these concerns into
//! one large trait per language; here the trait stays small and every
//! family implementation is table-driven where the grammar allows it, since
//! the closed set of 15 languages shares far more shape (class-like body,
//! function-like body, call expression) than it differs (§9 design note).

use crate::types::{EdgeKind, NodeKind};
use tree_sitter::Node;

/// A `(source_module, imported_name, local_alias)` triple emitted while
/// walking import statements (§4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportForm {
    pub source_module: String,
    /// `None` for a wildcard/namespace import (`import * as ns`, `from x
    /// import *`).
    pub imported_name: Option<String>,
    pub local_alias: String,
    pub is_wildcard: bool,
}

/// Behavior a family implementation must supply to drive the generic pass-1
/// and pass-2 traversals.
pub trait LanguageBehavior: Send + Sync {
    /// Tree-sitter node kind names that open a class-like scope (class,
    /// struct, interface, trait, enum with methods, etc. — §4.4 "Class"
    /// node mapping varies per language).
    fn class_node_kinds(&self) -> &'static [&'static str];

    /// Tree-sitter node kind names that open a free function.
    fn function_node_kinds(&self) -> &'static [&'static str];

    /// Tree-sitter node kind names that open a method (function nested in
    /// a class body). Some grammars reuse the function node kind for both;
    /// in that case this returns the same list and the caller disambiguates
    /// by lexical nesting.
    fn method_node_kinds(&self) -> &'static [&'static str];

    /// Tree-sitter node kind names for import/use/include statements.
    fn import_node_kinds(&self) -> &'static [&'static str];

    /// Tree-sitter node kind names for call expressions.
    fn call_node_kinds(&self) -> &'static [&'static str];

    /// Extract the declared name of a class/function/method node, if any
    /// (anonymous functions and lambdas return `None` and are excluded from
    /// the node/edge model per §4.4).
    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str>;

    /// Names naming this class/struct/interface as a supertype or
    /// superinterface, read directly off the class header, each tagged with
    /// `EdgeKind::Inherits` (extends a base class/struct/trait) or
    /// `EdgeKind::Implements` (implements an interface), per whichever
    /// header field the name came from (§4.4 inheritance side table,
    /// resolved to edges only after all Class nodes exist — §9).
    fn supertype_names<'a>(&self, class_node: Node<'a>, source: &'a str) -> Vec<(EdgeKind, &'a str)>;

    /// True if `node` is this language's constructor/initializer method
    /// (`__init__`, `constructor`, a method named after its enclosing
    /// class, etc. — §4.6 "new-expression inference").
    fn is_constructor(&self, method_name: &str, enclosing_class_name: Option<&str>) -> bool;

    /// Parse one import statement node into zero or more `ImportForm`s.
    /// Handles per-language shapes: Python `from x import a, b as c`,
    /// JS/TS `import {a as b} from './x'` (including the aliased
    /// re-export direction fix — §4.5), Go `import "pkg"`, etc.
    fn parse_import(&self, node: Node<'_>, source: &str) -> Vec<ImportForm>;

    /// Maps a tree-sitter node kind to the node kind it introduces, used by
    /// the generic pass-1 walker to dispatch without a giant per-language
    /// match (§4.4).
    fn node_kind_for(&self, ts_kind: &str) -> Option<NodeKind> {
        if self.class_node_kinds().contains(&ts_kind) {
            Some(NodeKind::Class)
        } else if self.method_node_kinds().contains(&ts_kind) {
            Some(NodeKind::Method)
        } else if self.function_node_kinds().contains(&ts_kind) {
            Some(NodeKind::Function)
        } else {
            None
        }
    }
}

pub(crate) fn node_text<'a>(node: Node<'a>, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

pub(crate) fn find_identifier_child<'a>(node: Node<'a>, source: &'a str) -> Option<&'a str> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "identifier" | "type_identifier" | "name") {
            return node_text(child, source);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_form_distinguishes_wildcard() {
        let named = ImportForm {
            source_module: "pkg.mod".into(),
            imported_name: Some("thing".into()),
            local_alias: "thing".into(),
            is_wildcard: false,
        };
        let wild = ImportForm {
            source_module: "pkg.mod".into(),
            imported_name: None,
            local_alias: "mod".into(),
            is_wildcard: true,
        };
        assert!(!named.is_wildcard);
        assert!(wild.is_wildcard);
    }
}
