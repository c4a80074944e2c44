//! The function registry: a prefix trie over FQN segments (spec §4.3).
//!
//! A flat hash map would serve point lookups, but the call resolver and
//! wildcard-import handling both need prefix queries ("everything defined
//! inside module M", "is FQN X a class?") — hence the trie (§9 design
//! note).

use crate::types::{FQN_SEPARATOR, NodeKind};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<String, TrieNode>,
    /// Present only at a terminal node (a fully declared FQN).
    kind: Option<NodeKind>,
}

/// Prefix trie keyed by `.`-separated FQN segments (GLOSSARY: Function
/// registry). Built single-writer during pass 1, queried read-only during
/// pass 2 (§5).
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    root: TrieNode,
    /// Declaration order is needed for the tie-break rule in §4.4/§4.7
    /// ("the first in declaration order wins" for overloads).
    insertion_order: Vec<String>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn segments(fqn: &str) -> impl Iterator<Item = &str> {
        fqn.split(FQN_SEPARATOR)
    }

    /// Idempotent; a second insert with a conflicting kind is an
    /// internal-invariant warning, not an error (§4.3, §7). Returns
    /// `Some(previous_kind)` when the FQN already existed with a different
    /// kind, so the caller can record the warning.
    pub fn insert(&mut self, fqn: &str, kind: NodeKind) -> Option<NodeKind> {
        let mut node = &mut self.root;
        for seg in Self::segments(fqn) {
            node = node.children.entry(seg.to_string()).or_default();
        }
        let conflict = match node.kind {
            Some(existing) if existing != kind => Some(existing),
            _ => None,
        };
        if node.kind.is_none() {
            self.insertion_order.push(fqn.to_string());
        }
        if conflict.is_none() {
            node.kind = Some(kind);
        }
        conflict
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.lookup(fqn).is_some()
    }

    pub fn lookup(&self, fqn: &str) -> Option<NodeKind> {
        let mut node = &self.root;
        for seg in Self::segments(fqn) {
            node = node.children.get(seg)?;
        }
        node.kind
    }

    /// Everything registered under `prefix` (inclusive), in declaration
    /// order — used for wildcard-import resolution (§4.5) and "is FQN X a
    /// class" style queries (§4.3 rationale).
    pub fn prefix_scan(&self, prefix: &str) -> Vec<(String, NodeKind)> {
        self.insertion_order
            .iter()
            .filter(|fqn| {
                fqn.as_str() == prefix
                    || fqn
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with(FQN_SEPARATOR))
            })
            .filter_map(|fqn| self.lookup(fqn).map(|kind| (fqn.clone(), kind)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup_roundtrip() {
        let mut reg = FunctionRegistry::new();
        reg.insert("a.C", NodeKind::Class);
        reg.insert("a.C.f", NodeKind::Method);
        assert_eq!(reg.lookup("a.C"), Some(NodeKind::Class));
        assert_eq!(reg.lookup("a.C.f"), Some(NodeKind::Method));
        assert_eq!(reg.lookup("a.C.g"), None);
        assert!(reg.contains("a.C"));
        assert!(!reg.contains("a.D"));
    }

    #[test]
    fn insert_is_idempotent() {
        let mut reg = FunctionRegistry::new();
        assert_eq!(reg.insert("a.f", NodeKind::Function), None);
        assert_eq!(reg.insert("a.f", NodeKind::Function), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn conflicting_kind_reports_previous_and_keeps_first() {
        let mut reg = FunctionRegistry::new();
        reg.insert("a.f", NodeKind::Function);
        let conflict = reg.insert("a.f", NodeKind::Class);
        assert_eq!(conflict, Some(NodeKind::Function));
        // first insert wins
        assert_eq!(reg.lookup("a.f"), Some(NodeKind::Function));
    }

    #[test]
    fn prefix_scan_returns_only_descendants_and_self() {
        let mut reg = FunctionRegistry::new();
        reg.insert("a", NodeKind::Module);
        reg.insert("a.C", NodeKind::Class);
        reg.insert("a.C.f", NodeKind::Method);
        reg.insert("ab.g", NodeKind::Function);

        let scanned = reg.prefix_scan("a");
        let fqns: Vec<_> = scanned.iter().map(|(f, _)| f.as_str()).collect();
        assert!(fqns.contains(&"a"));
        assert!(fqns.contains(&"a.C"));
        assert!(fqns.contains(&"a.C.f"));
        assert!(!fqns.contains(&"ab.g"));
    }

    #[test]
    fn declaration_order_is_preserved_for_tie_breaks() {
        let mut reg = FunctionRegistry::new();
        reg.insert("a.f#0", NodeKind::Function);
        reg.insert("a.f#1", NodeKind::Function);
        let scanned = reg.prefix_scan("a");
        assert_eq!(scanned[0].0, "a.f#0");
        assert_eq!(scanned[1].0, "a.f#1");
    }
}
