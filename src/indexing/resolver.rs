//! Pass 2, call resolution (spec §4.7): classifies each call expression in
//! a function/method body and resolves it to a CALLS edge target using the
//! function registry, the import mapping, and the local variable type map
//! built by `inference` — all read-only collaborators during this pass
//! (§5 "pass 2... operates read-only over the shared registry").

use crate::indexing::imports::{ImportMapping, ImportTarget};
use crate::indexing::inference::LocalTypeMap;
use crate::registry::FunctionRegistry;
use crate::types::FQN_SEPARATOR;
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallShape {
    /// `f(...)` — a bare identifier call.
    Bare(String),
    /// `obj.method(...)` — a single-receiver method call.
    Method { receiver: String, method: String },
    /// `obj.m1().m2()...` — a chained call, depth-limited by
    /// `call_chain_depth` (§4.7 "chained calls... depth-limited").
    Chained(Vec<String>),
    /// `new Ctor(...)`.
    Construct(String),
    /// `super.method(...)` / parent-class call.
    SuperCall(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedCall {
    pub caller_fqn: String,
    pub target_fqn: String,
}

pub struct CallResolutionStats {
    pub resolved: u32,
    pub misses: u32,
}

/// Classifies one call-expression node into a `CallShape` (§4.7).
pub fn classify_call(call_node: Node<'_>, source: &str, call_chain_depth: usize) -> Option<CallShape> {
    if matches!(call_node.kind(), "new_expression" | "object_creation_expression") {
        let ctor = super_constructor_name(call_node, source)?;
        return Some(CallShape::Construct(ctor.to_string()));
    }

    let callee = call_node
        .child_by_field_name("function")
        .or_else(|| call_node.child_by_field_name("name"))
        .or_else(|| call_node.child(0))?;

    match callee.kind() {
        "identifier" | "type_identifier" => {
            let name = callee.utf8_text(source.as_bytes()).ok()?;
            Some(CallShape::Bare(name.to_string()))
        }
        "member_expression" | "attribute" | "field_expression" | "scoped_identifier" => {
            let chain = flatten_member_chain(callee, source);
            if chain.len() <= 1 {
                return None;
            }
            if chain[0] == "super" {
                return Some(CallShape::SuperCall(chain.last()?.clone()));
            }
            if chain.len() == 2 {
                Some(CallShape::Method {
                    receiver: chain[0].clone(),
                    method: chain[1].clone(),
                })
            } else {
                // depth-limit: keep at most `call_chain_depth` hops beyond
                // the receiver, dropping the rest (§4.7).
                let mut truncated = chain;
                truncated.truncate((call_chain_depth + 1).max(2));
                Some(CallShape::Chained(truncated))
            }
        }
        _ => None,
    }
}

fn super_constructor_name<'a>(node: Node<'a>, source: &'a str) -> Option<&'a str> {
    let callee = node
        .child_by_field_name("constructor")
        .or_else(|| node.child_by_field_name("type"))
        .or_else(|| node.child_by_field_name("name"))?;
    callee.utf8_text(source.as_bytes()).ok()
}

/// Flattens `a.b.c` / `a::b::c` into `["a", "b", "c"]`.
fn flatten_member_chain(node: Node<'_>, source: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = Some(node);
    let mut trail = Vec::new();
    while let Some(n) = current {
        match n.kind() {
            "member_expression" | "attribute" | "field_expression" => {
                let prop = n
                    .child_by_field_name("property")
                    .or_else(|| n.child_by_field_name("attribute"))
                    .or_else(|| n.child_by_field_name("field"));
                if let Some(p) = prop {
                    if let Ok(text) = p.utf8_text(source.as_bytes()) {
                        trail.push(text.to_string());
                    }
                }
                current = n
                    .child_by_field_name("object")
                    .or_else(|| n.child_by_field_name("value"));
            }
            "scoped_identifier" => {
                if let Ok(text) = n.utf8_text(source.as_bytes()) {
                    parts.extend(text.split("::").map(str::to_string));
                }
                current = None;
            }
            "identifier" | "this" | "super" => {
                if let Ok(text) = n.utf8_text(source.as_bytes()) {
                    trail.push(text.to_string());
                }
                current = None;
            }
            _ => current = None,
        }
    }
    if !parts.is_empty() {
        return parts;
    }
    trail.reverse();
    trail
}

/// Resolves a classified call to a target FQN. Tries, in order: local
/// variable type map (for a method-shaped call), import mapping, same
/// -module registry lookup, then project-wide ambiguity via
/// `prefix_scan` when nothing else matches. Returns `None` on a genuine
/// miss, which the caller records as a `resolution-miss` (§4.7, §7).
///
/// `constructors` maps a Class FQN to the FQN of the constructor Method
/// pass 1 tagged for it, if any (§4.7 item 4: a `new X(...)`/`X(...)` call
/// targets the constructor Method when one is registered, falling back to
/// the Class node only when the class has none).
pub fn resolve_call(
    shape: &CallShape,
    caller_module_fqn: &str,
    enclosing_class_fqn: Option<&str>,
    locals: &LocalTypeMap,
    imports: &ImportMapping,
    registry: &FunctionRegistry,
    constructors: &HashMap<String, String>,
) -> Option<String> {
    match shape {
        CallShape::Bare(name) => resolve_name(name, caller_module_fqn, imports, registry),
        CallShape::Construct(name) => {
            let class_fqn = resolve_name(name, caller_module_fqn, imports, registry)?;
            Some(constructors.get(&class_fqn).cloned().unwrap_or(class_fqn))
        }
        CallShape::SuperCall(method) => {
            // resolved by the link phase once the parent class is known;
            // pass 2 can only resolve it if the parent happens to share
            // this module (common case for single-file hierarchies).
            let candidate = format!("{caller_module_fqn}{FQN_SEPARATOR}{method}");
            registry.contains(&candidate).then_some(candidate)
        }
        CallShape::Method { receiver, method } => {
            resolve_method(receiver, method, caller_module_fqn, enclosing_class_fqn, locals, imports, registry)
        }
        CallShape::Chained(chain) => {
            let receiver = &chain[0];
            let method = chain.last()?;
            resolve_method(receiver, method, caller_module_fqn, enclosing_class_fqn, locals, imports, registry)
        }
    }
}

fn resolve_name(
    name: &str,
    caller_module_fqn: &str,
    imports: &ImportMapping,
    registry: &FunctionRegistry,
) -> Option<String> {
    let local_candidate = format!("{caller_module_fqn}{FQN_SEPARATOR}{name}");
    if registry.contains(&local_candidate) {
        return Some(local_candidate);
    }
    match imports.resolve(name) {
        Some(ImportTarget::Named(fqn)) if registry.contains(fqn) => Some(fqn.clone()),
        Some(ImportTarget::Wildcard { source_module_fqn }) => {
            let candidate = format!("{source_module_fqn}{FQN_SEPARATOR}{name}");
            registry.contains(&candidate).then_some(candidate)
        }
        _ => registry.contains(name).then(|| name.to_string()),
    }
}

fn resolve_method(
    receiver: &str,
    method: &str,
    caller_module_fqn: &str,
    enclosing_class_fqn: Option<&str>,
    locals: &LocalTypeMap,
    imports: &ImportMapping,
    registry: &FunctionRegistry,
) -> Option<String> {
    let receiver_type = if receiver == "this" || receiver == "self" {
        enclosing_class_fqn.map(str::to_string)
    } else if let Some(ty) = locals.get(receiver) {
        Some(ty.to_string())
    } else {
        resolve_name(receiver, caller_module_fqn, imports, registry)
    };

    let receiver_fqn = receiver_type?;
    let candidate = format!("{receiver_fqn}{FQN_SEPARATOR}{method}");
    registry.contains(&candidate).then_some(candidate)
}

/// Deduplicates resolved calls per caller, keeping first-declaration order
/// (§4.7 "dedup per caller, tie-break to first declaration order").
pub fn dedupe_calls(calls: Vec<ResolvedCall>) -> Vec<ResolvedCall> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .filter(|c| seen.insert((c.caller_fqn.clone(), c.target_fqn.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_call_resolves_within_same_module() {
        let mut registry = FunctionRegistry::new();
        registry.insert("m.helper", crate::types::NodeKind::Function);
        let imports = ImportMapping::default();
        let locals = LocalTypeMap::default();
        let constructors = HashMap::new();

        let target = resolve_call(
            &CallShape::Bare("helper".to_string()),
            "m",
            None,
            &locals,
            &imports,
            &registry,
            &constructors,
        );
        assert_eq!(target.as_deref(), Some("m.helper"));
    }

    #[test]
    fn self_method_call_resolves_via_enclosing_class() {
        let mut registry = FunctionRegistry::new();
        registry.insert("m.Widget.helper", crate::types::NodeKind::Method);
        let imports = ImportMapping::default();
        let locals = LocalTypeMap::default();
        let constructors = HashMap::new();

        let target = resolve_call(
            &CallShape::Method {
                receiver: "self".to_string(),
                method: "helper".to_string(),
            },
            "m",
            Some("m.Widget"),
            &locals,
            &imports,
            &registry,
            &constructors,
        );
        assert_eq!(target.as_deref(), Some("m.Widget.helper"));
    }

    #[test]
    fn unresolvable_call_is_a_miss() {
        let registry = FunctionRegistry::new();
        let imports = ImportMapping::default();
        let locals = LocalTypeMap::default();
        let constructors = HashMap::new();
        let target = resolve_call(
            &CallShape::Bare("unknown".to_string()),
            "m",
            None,
            &locals,
            &imports,
            &registry,
            &constructors,
        );
        assert!(target.is_none());
    }

    #[test]
    fn construct_call_prefers_registered_constructor_over_class() {
        let mut registry = FunctionRegistry::new();
        registry.insert("m.Foo", crate::types::NodeKind::Class);
        registry.insert("m.Foo.__init__", crate::types::NodeKind::Method);
        let imports = ImportMapping::default();
        let locals = LocalTypeMap::default();
        let mut constructors = HashMap::new();
        constructors.insert("m.Foo".to_string(), "m.Foo.__init__".to_string());

        let target = resolve_call(
            &CallShape::Construct("Foo".to_string()),
            "m",
            None,
            &locals,
            &imports,
            &registry,
            &constructors,
        );
        assert_eq!(target.as_deref(), Some("m.Foo.__init__"));
    }

    #[test]
    fn construct_call_falls_back_to_class_without_a_constructor() {
        let mut registry = FunctionRegistry::new();
        registry.insert("m.Bar", crate::types::NodeKind::Class);
        let imports = ImportMapping::default();
        let locals = LocalTypeMap::default();
        let constructors = HashMap::new();

        let target = resolve_call(
            &CallShape::Construct("Bar".to_string()),
            "m",
            None,
            &locals,
            &imports,
            &registry,
            &constructors,
        );
        assert_eq!(target.as_deref(), Some("m.Bar"));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let calls = vec![
            ResolvedCall { caller_fqn: "m.f".into(), target_fqn: "m.g".into() },
            ResolvedCall { caller_fqn: "m.f".into(), target_fqn: "m.g".into() },
            ResolvedCall { caller_fqn: "m.f".into(), target_fqn: "m.h".into() },
        ];
        let deduped = dedupe_calls(calls);
        assert_eq!(deduped.len(), 2);
    }
}
