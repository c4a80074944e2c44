//! Final link phase (spec §9): resolves the raw supertype names pass 1
//! collected per class into INHERITS edges, after every file has been
//! walked and every Class node is known to exist. Running this after pass
//! 1 instead of during it means a class can reference a supertype declared
//! later in the same file, in a different file, or (once resolvable)
//! circularly — the phase tolerates cycles, it does not need to break them
//! since it only ever emits edges, never walks the inheritance graph itself.

use crate::graph::{EdgeWrite, NodeDescriptor, Props};
use crate::indexing::definitions::PendingSupertype;
use crate::indexing::imports::{ImportMapping, ImportTarget};
use crate::types::{EdgeKind, NodeKind, FQN_SEPARATOR};
use std::collections::HashMap;

/// Maps a class's simple (unqualified) name to every FQN registered under
/// that name, so an ambiguous supertype reference can be detected rather
/// than silently resolved to an arbitrary candidate (§7 `ambiguity`).
#[derive(Debug, Default)]
pub struct ClassNameIndex {
    by_simple_name: HashMap<String, Vec<String>>,
}

impl ClassNameIndex {
    pub fn insert(&mut self, class_fqn: &str) {
        let simple = class_fqn.rsplit(FQN_SEPARATOR).next().unwrap_or(class_fqn);
        self.by_simple_name
            .entry(simple.to_string())
            .or_default()
            .push(class_fqn.to_string());
    }

    fn candidates(&self, simple_name: &str) -> &[String] {
        self.by_simple_name
            .get(simple_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub enum LinkOutcome {
    Resolved(EdgeWrite),
    Miss,
    Ambiguous,
}

/// Resolves one pending supertype reference. `module_of_class` and
/// `imports_of_class` let the resolver prefer an explicit import over a
/// same-named class in an unrelated module.
pub fn resolve_supertype(
    pending: &PendingSupertype,
    module_of_class: &str,
    imports_of_class: Option<&ImportMapping>,
    index: &ClassNameIndex,
) -> LinkOutcome {
    if let Some(imports) = imports_of_class {
        if let Some(ImportTarget::Named(fqn)) = imports.resolve(&pending.supertype_name) {
            return LinkOutcome::Resolved(supertype_edge(&pending.class_fqn, fqn, pending.edge_kind));
        }
    }

    let local_candidate = format!("{module_of_class}{FQN_SEPARATOR}{}", pending.supertype_name);
    let candidates = index.candidates(&pending.supertype_name);
    let local_exists = candidates.iter().any(|fqn| fqn == &local_candidate);
    if local_exists {
        return LinkOutcome::Resolved(supertype_edge(&pending.class_fqn, &local_candidate, pending.edge_kind));
    }

    match candidates.len() {
        0 => LinkOutcome::Miss,
        1 => LinkOutcome::Resolved(supertype_edge(&pending.class_fqn, &candidates[0], pending.edge_kind)),
        _ => LinkOutcome::Ambiguous,
    }
}

/// Emits the edge kind pass 1 tagged the reference with — `Inherits` for an
/// extended base class/struct/trait, `Implements` for an implemented
/// interface (§3 Invariant 6 treats them as distinct relationship kinds).
fn supertype_edge(class_fqn: &str, supertype_fqn: &str, kind: EdgeKind) -> EdgeWrite {
    EdgeWrite {
        src: NodeDescriptor::by_qualified_name(NodeKind::Class, class_fqn),
        kind,
        dst: NodeDescriptor::by_qualified_name(NodeKind::Class, supertype_fqn),
        props: Props::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_unambiguous_candidate() {
        let mut index = ClassNameIndex::default();
        index.insert("pkg.base.Animal");
        let pending = PendingSupertype {
            class_fqn: "pkg.zoo.Dog".into(),
            supertype_name: "Animal".into(),
            edge_kind: EdgeKind::Inherits,
        };
        match resolve_supertype(&pending, "pkg.zoo", None, &index) {
            LinkOutcome::Resolved(edge) => assert_eq!(edge.dst.key_value, "pkg.base.Animal"),
            _ => panic!("expected resolution"),
        }
    }

    #[test]
    fn implements_tag_is_preserved_on_the_resolved_edge() {
        let mut index = ClassNameIndex::default();
        index.insert("pkg.base.Flyable");
        let pending = PendingSupertype {
            class_fqn: "pkg.zoo.Bird".into(),
            supertype_name: "Flyable".into(),
            edge_kind: EdgeKind::Implements,
        };
        match resolve_supertype(&pending, "pkg.zoo", None, &index) {
            LinkOutcome::Resolved(edge) => assert_eq!(edge.kind, EdgeKind::Implements),
            _ => panic!("expected resolution"),
        }
    }

    #[test]
    fn ambiguous_candidates_are_reported() {
        let mut index = ClassNameIndex::default();
        index.insert("pkg.a.Base");
        index.insert("pkg.b.Base");
        let pending = PendingSupertype {
            class_fqn: "pkg.c.Derived".into(),
            supertype_name: "Base".into(),
            edge_kind: EdgeKind::Inherits,
        };
        assert!(matches!(
            resolve_supertype(&pending, "pkg.c", None, &index),
            LinkOutcome::Ambiguous
        ));
    }

    #[test]
    fn unknown_supertype_is_a_miss() {
        let index = ClassNameIndex::default();
        let pending = PendingSupertype {
            class_fqn: "pkg.c.Derived".into(),
            supertype_name: "Ghost".into(),
            edge_kind: EdgeKind::Inherits,
        };
        assert!(matches!(
            resolve_supertype(&pending, "pkg.c", None, &index),
            LinkOutcome::Miss
        ));
    }
}
