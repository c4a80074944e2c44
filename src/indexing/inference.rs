//! Pass 2, type inference (spec §4.6): builds a per-function map from local
//! variable name to inferred type FQN, and infers a function/method's
//! return type when the body makes it unambiguous. Neither is full type
//! checking — both are best-effort heuristics that feed the call resolver,
//! and a miss is recorded as a `resolution-miss`, never a fatal error.
//!
//! Grounded in the original Python reference implementation's
//! `js_utils.py`: `extract_js_constructor_name`, `analyze_js_return_expression`
//! and the iterative (non-recursive) `find_js_return_statements` /
//! `find_js_method_in_ast` walks, generalized here across the whole
//! language family rather than JS/TS alone (SPEC_FULL.md §C).

use crate::indexing::imports::{ImportMapping, ImportTarget};
use crate::registry::FunctionRegistry;
use crate::types::{NodeKind, FQN_SEPARATOR};
use std::collections::HashMap;
use tree_sitter::Node;

/// Node kinds that introduce a "new instance" expression across the
/// closed language set.
const NEW_EXPRESSION_KINDS: &[&str] = &[
    "new_expression",           // JS/TS/C#
    "object_creation_expression", // Java/PHP/C#
];

/// Receiver names that mean "the enclosing class instance" rather than a
/// local variable, across the closed set.
const SELF_RECEIVER_NAMES: &[&str] = &["this", "self"];

#[derive(Debug, Default, Clone)]
pub struct LocalTypeMap {
    vars: HashMap<String, String>,
}

impl LocalTypeMap {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Resolves a bare type/constructor name to a FQN using, in order: the
/// import mapping, the current module's own definitions (registry prefix),
/// then the bare name itself (left unresolved — the caller records a
/// resolution-miss). The import mapping goes first since an imported name
/// shadows a same-named local definition (§4.6 step 3).
fn resolve_type_name(
    name: &str,
    module_fqn: &str,
    registry: &FunctionRegistry,
    imports: &ImportMapping,
) -> Option<String> {
    if let Some(ImportTarget::Named(fqn)) = imports.resolve(name) {
        return Some(fqn.clone());
    }
    let local_candidate = format!("{module_fqn}{FQN_SEPARATOR}{name}");
    if registry.contains(&local_candidate) {
        return Some(local_candidate);
    }
    if registry.contains(name) {
        Some(name.to_string())
    } else {
        None
    }
}

/// `new Ctor(...)` / `Ctor(...)` object-creation node -> constructor name.
fn constructor_name<'a>(new_expr: Node<'a>, source: &'a str) -> Option<&'a str> {
    let callee = new_expr
        .child_by_field_name("constructor")
        .or_else(|| new_expr.child_by_field_name("type"))
        .or_else(|| new_expr.child_by_field_name("name"))?;
    let mut node = callee;
    // Some grammars wrap the name in a generic_type/scoped path; take the
    // last identifier-like leaf.
    loop {
        match node.kind() {
            "identifier" | "type_identifier" => return node.utf8_text(source.as_bytes()).ok(),
            _ => {
                let mut cursor = node.walk();
                let children: Vec<_> = node.children(&mut cursor).collect();
                if let Some(last) = children.last() {
                    node = *last;
                } else {
                    return node.utf8_text(source.as_bytes()).ok();
                }
            }
        }
    }
}

/// Walks a callable body (iterative — no recursion, §8 property 11) and
/// records the type of every local variable it can infer.
pub fn build_local_var_type_map(
    body: Node<'_>,
    source: &str,
    module_fqn: &str,
    enclosing_class_fqn: Option<&str>,
    registry: &FunctionRegistry,
    imports: &ImportMapping,
    return_types: &HashMap<String, String>,
) -> LocalTypeMap {
    let mut map = LocalTypeMap::default();
    let mut stack = vec![body];

    while let Some(node) = stack.pop() {
        if matches!(
            node.kind(),
            "assignment_expression" | "assignment" | "variable_declarator" | "let_declaration"
        ) {
            if let (Some(lhs), Some(rhs)) = (
                node.child_by_field_name("left")
                    .or_else(|| node.child_by_field_name("name")),
                node.child_by_field_name("right")
                    .or_else(|| node.child_by_field_name("value")),
            ) {
                if let Some(var_name) = lhs.utf8_text(source.as_bytes()).ok() {
                    if let Some(ty) = infer_expression_type(
                        rhs,
                        source,
                        module_fqn,
                        enclosing_class_fqn,
                        registry,
                        imports,
                        return_types,
                    ) {
                        map.vars.insert(var_name.to_string(), ty);
                    }
                }
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }

    map
}

/// Infers the type produced by an expression: new-expression inference,
/// bare-call factory inference, or chained `receiver.method()` inference
/// via the callee's known return type.
fn infer_expression_type(
    expr: Node<'_>,
    source: &str,
    module_fqn: &str,
    enclosing_class_fqn: Option<&str>,
    registry: &FunctionRegistry,
    imports: &ImportMapping,
    return_types: &HashMap<String, String>,
) -> Option<String> {
    if NEW_EXPRESSION_KINDS.contains(&expr.kind()) {
        let name = constructor_name(expr, source)?;
        return resolve_type_name(name, module_fqn, registry, imports);
    }

    if matches!(expr.kind(), "call_expression" | "call" | "function_call_expression" | "invocation_expression" | "method_invocation") {
        let callee = expr
            .child_by_field_name("function")
            .or_else(|| expr.child_by_field_name("name"))
            .or_else(|| expr.child(0))?;

        if callee.kind() == "member_expression" || callee.kind() == "attribute" || callee.kind() == "field_expression" {
            let receiver = callee.child_by_field_name("object")
                .or_else(|| callee.child_by_field_name("value"))
                .or_else(|| callee.child(0))?;
            let method_name = callee
                .child_by_field_name("property")
                .or_else(|| callee.child_by_field_name("attribute"))
                .or_else(|| callee.child(callee.child_count().saturating_sub(1)))
                .and_then(|n| n.utf8_text(source.as_bytes()).ok())?;

            let receiver_text = receiver.utf8_text(source.as_bytes()).ok()?;
            let receiver_type = if SELF_RECEIVER_NAMES.contains(&receiver_text) {
                enclosing_class_fqn.map(str::to_string)
            } else {
                // Any other identifier — a singleton/static-factory
                // receiver like `S` in `S.getInstance()` — resolves through
                // the same import/registry lookup a bare call would (§4.6
                // step 2, scenario S3), not just the this/self shortcut.
                resolve_type_name(receiver_text, module_fqn, registry, imports)
            };
            let receiver_fqn = receiver_type?;
            let method_fqn = format!("{receiver_fqn}{FQN_SEPARATOR}{method_name}");
            return return_types.get(&method_fqn).cloned();
        }

        // `x = C()` where `C` is a class known to the registry — a
        // constructor call in languages (Python, Ruby-style) that don't
        // have a dedicated `new` syntax.
        let name = callee.utf8_text(source.as_bytes()).ok()?;
        let fqn = resolve_type_name(name, module_fqn, registry, imports)?;
        if registry.lookup(&fqn) == Some(NodeKind::Class) {
            return Some(fqn);
        }

        // otherwise, bare-call factory inference: `x = make_widget()`
        return_types.get(&fqn).cloned()
    }

    None
}

/// Infers a callable's return type from its body, scanning `return`
/// statements iteratively (no recursion — §8 property 11). Covers the two
/// behaviors the original reference implementation's `js_utils.py`
/// special-cases: `return new Ctor()` and `return this` /
/// `return this.field` where `field`'s declared type is the enclosing
/// class (SPEC_FULL.md §C).
pub fn infer_return_type(
    body: Node<'_>,
    source: &str,
    module_fqn: &str,
    enclosing_class_fqn: Option<&str>,
    registry: &FunctionRegistry,
    imports: &ImportMapping,
) -> Option<String> {
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if node.kind() == "return_statement" || node.kind() == "return" {
            let Some(value) = node.named_child(0) else {
                continue;
            };
            if NEW_EXPRESSION_KINDS.contains(&value.kind()) {
                let name = constructor_name(value, source)?;
                return resolve_type_name(name, module_fqn, registry, imports);
            }
            if let Some(text) = value.utf8_text(source.as_bytes()).ok() {
                if SELF_RECEIVER_NAMES.contains(&text) {
                    return enclosing_class_fqn.map(str::to_string);
                }
            }
            if matches!(value.kind(), "member_expression" | "attribute" | "field_expression") {
                if let Some(object) = value.child_by_field_name("object").or_else(|| value.child(0)) {
                    if let Some(text) = object.utf8_text(source.as_bytes()).ok() {
                        if SELF_RECEIVER_NAMES.contains(&text) {
                            return enclosing_class_fqn.map(str::to_string);
                        }
                        // `return ClassName.property` — the object names the
                        // enclosing class by its own (simple) name rather
                        // than this/self, mirroring the reference
                        // implementation's `object_name == qn_parts[-2]`
                        // check (SPEC_FULL.md §C item 2).
                        let enclosing_simple_name =
                            enclosing_class_fqn.and_then(|fqn| fqn.rsplit(FQN_SEPARATOR).next());
                        if enclosing_simple_name == Some(text) {
                            return enclosing_class_fqn.map(str::to_string);
                        }
                    }
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{parse_file, GrammarRegistry};
    use crate::types::Language;

    #[test]
    fn infers_new_expression_assignment() {
        let registry_ts = GrammarRegistry::new();
        let file = parse_file(
            &registry_ts,
            "test.js".into(),
            Language::JavaScript,
            "function f() { let w = new Widget(); }".to_string(),
        )
        .unwrap();

        let mut reg = FunctionRegistry::new();
        reg.insert("m.Widget", NodeKind::Class);
        let imports = ImportMapping::default();
        let return_types = HashMap::new();

        let fn_node = file
            .tree
            .root_node()
            .named_child(0)
            .unwrap()
            .child_by_field_name("body")
            .unwrap();
        let map = build_local_var_type_map(fn_node, &file.source, "m", None, &reg, &imports, &return_types);
        assert_eq!(map.get("w"), Some("m.Widget"));
    }

    #[test]
    fn return_this_infers_enclosing_class() {
        let grammar = GrammarRegistry::new();
        let file = parse_file(
            &grammar,
            "test.js".into(),
            Language::JavaScript,
            "class Builder { build() { return this; } }".to_string(),
        )
        .unwrap();
        let reg = FunctionRegistry::new();
        let imports = ImportMapping::default();

        let class_node = file.tree.root_node().named_child(0).unwrap();
        let body = class_node.child_by_field_name("body").unwrap();
        let method = body.named_child(0).unwrap();
        let method_body = method.child_by_field_name("body").unwrap();

        let inferred = infer_return_type(method_body, &file.source, "m", Some("m.Builder"), &reg, &imports);
        assert_eq!(inferred.as_deref(), Some("m.Builder"));
    }

    #[test]
    fn return_class_name_property_infers_enclosing_class() {
        let grammar = GrammarRegistry::new();
        let file = parse_file(
            &grammar,
            "test.js".into(),
            Language::JavaScript,
            "class Singleton { static get() { return Singleton.instance; } }".to_string(),
        )
        .unwrap();
        let reg = FunctionRegistry::new();
        let imports = ImportMapping::default();

        let class_node = file.tree.root_node().named_child(0).unwrap();
        let body = class_node.child_by_field_name("body").unwrap();
        let method = body.named_child(0).unwrap();
        let method_body = method.child_by_field_name("body").unwrap();

        let inferred = infer_return_type(method_body, &file.source, "m", Some("m.Singleton"), &reg, &imports);
        assert_eq!(inferred.as_deref(), Some("m.Singleton"));
    }

    #[test]
    fn static_factory_receiver_resolves_through_registry() {
        let grammar = GrammarRegistry::new();
        let file = parse_file(
            &grammar,
            "test.js".into(),
            Language::JavaScript,
            "function f() { let s = S.getInstance(); }".to_string(),
        )
        .unwrap();

        let mut reg = FunctionRegistry::new();
        reg.insert("m.S", NodeKind::Class);
        let imports = ImportMapping::default();
        let mut return_types = HashMap::new();
        return_types.insert("m.S.getInstance".to_string(), "m.S".to_string());

        let fn_node = file
            .tree
            .root_node()
            .named_child(0)
            .unwrap()
            .child_by_field_name("body")
            .unwrap();
        let map = build_local_var_type_map(fn_node, &file.source, "m", None, &reg, &imports, &return_types);
        assert_eq!(map.get("s"), Some("m.S"));
    }
}
