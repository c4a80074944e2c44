//! The data model (spec §3): node/edge payloads and the descriptor type
//! the ingestor uses to address a node without knowing its internal id.

use crate::types::{EdgeKind, FileId, Language, NodeKind, Range};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A property value attached to a node or edge. Kept deliberately small:
/// the graph store is an external collaborator (§6) and only needs to
/// round-trip scalars through a parameterized query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Str(v.to_string())
    }
}
impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Str(v)
    }
}
impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}
impl From<u32> for PropValue {
    fn from(v: u32) -> Self {
        PropValue::Int(v as i64)
    }
}
impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

pub type Props = HashMap<String, PropValue>;

/// Identifies a node by a unique key rather than an internal id, matching
/// the ingestor contract in §4.8 ("Descriptors are `(label, key_attribute,
/// key_value)` tuples").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub label: NodeKind,
    pub key_attribute: &'static str,
    pub key_value: String,
}

impl NodeDescriptor {
    /// Every node kind in this model is keyed by `qualified_name` except
    /// Project, which has no parent FQN and is keyed by its root path.
    pub fn by_qualified_name(label: NodeKind, fqn: &str) -> Self {
        Self {
            label,
            key_attribute: "qualified_name",
            key_value: fqn.to_string(),
        }
    }

    pub fn project(root_path: &str) -> Self {
        Self {
            label: NodeKind::Project,
            key_attribute: "root_path",
            key_value: root_path.to_string(),
        }
    }
}

/// A node creation/update request queued for the ingestor (§4.8
/// `ensure_node_batch`).
#[derive(Debug, Clone)]
pub struct NodeWrite {
    pub descriptor: NodeDescriptor,
    pub props: Props,
}

/// A relationship creation request (§4.8 `ensure_relationship_batch`).
#[derive(Debug, Clone)]
pub struct EdgeWrite {
    pub src: NodeDescriptor,
    pub kind: EdgeKind,
    pub dst: NodeDescriptor,
    pub props: Props,
}

/// Helpers for building the well-known node shapes from §3 so that pass 1
/// and pass 2 don't hand-roll property maps.
pub struct NodeBuilder;

impl NodeBuilder {
    pub fn project(name: &str, root_path: &str) -> NodeWrite {
        let mut props = Props::new();
        props.insert("name".into(), name.into());
        props.insert("root_path".into(), root_path.into());
        NodeWrite {
            descriptor: NodeDescriptor::project(root_path),
            props,
        }
    }

    pub fn package(fqn: &str, name: &str) -> NodeWrite {
        let mut props = Props::new();
        props.insert("name".into(), name.into());
        props.insert("qualified_name".into(), fqn.into());
        NodeWrite {
            descriptor: NodeDescriptor::by_qualified_name(NodeKind::Package, fqn),
            props,
        }
    }

    pub fn module(fqn: &str, language: Language, path: &str, source_len: u64) -> NodeWrite {
        let mut props = Props::new();
        props.insert("qualified_name".into(), fqn.into());
        props.insert("language".into(), language.name().into());
        props.insert("path".into(), path.into());
        props.insert("source_bytes".into(), source_len as i64);
        NodeWrite {
            descriptor: NodeDescriptor::by_qualified_name(NodeKind::Module, fqn),
            props,
        }
    }

    pub fn class(fqn: &str, name: &str, language: Language, range: Range) -> NodeWrite {
        let mut props = Props::new();
        props.insert("name".into(), name.into());
        props.insert("qualified_name".into(), fqn.into());
        props.insert("language".into(), language.name().into());
        props.insert("start_line".into(), range.start_line as i64);
        props.insert("end_line".into(), range.end_line as i64);
        NodeWrite {
            descriptor: NodeDescriptor::by_qualified_name(NodeKind::Class, fqn),
            props,
        }
    }

    pub fn function(fqn: &str, name: &str, language: Language, range: Range) -> NodeWrite {
        let mut props = Props::new();
        props.insert("name".into(), name.into());
        props.insert("qualified_name".into(), fqn.into());
        props.insert("language".into(), language.name().into());
        props.insert("start_line".into(), range.start_line as i64);
        props.insert("end_line".into(), range.end_line as i64);
        NodeWrite {
            descriptor: NodeDescriptor::by_qualified_name(NodeKind::Function, fqn),
            props,
        }
    }

    pub fn method(
        fqn: &str,
        name: &str,
        language: Language,
        range: Range,
        enclosing_class_fqn: &str,
        is_constructor: bool,
    ) -> NodeWrite {
        let mut props = Props::new();
        props.insert("name".into(), name.into());
        props.insert("qualified_name".into(), fqn.into());
        props.insert("language".into(), language.name().into());
        props.insert("start_line".into(), range.start_line as i64);
        props.insert("end_line".into(), range.end_line as i64);
        props.insert("class_qualified_name".into(), enclosing_class_fqn.into());
        props.insert("is_constructor".into(), is_constructor.into());
        NodeWrite {
            descriptor: NodeDescriptor::by_qualified_name(NodeKind::Method, fqn),
            props,
        }
    }

    pub fn external_module(fqn: &str) -> NodeWrite {
        let mut props = Props::new();
        props.insert("qualified_name".into(), fqn.into());
        props.insert("external".into(), true.into());
        NodeWrite {
            descriptor: NodeDescriptor::by_qualified_name(NodeKind::Module, fqn),
            props,
        }
    }
}

/// A fully-resolved entity that pass 1 emitted, kept in memory for pass 2
/// and the link phase. Not itself part of the external graph-store
/// contract; this is the ingestion-time bookkeeping record.
#[derive(Debug, Clone)]
pub struct EmittedEntity {
    pub fqn: String,
    pub kind: NodeKind,
    pub file_id: FileId,
    pub range: Range,
    /// For Method: the enclosing class FQN. For a Class declared inside a
    /// function: the enclosing function FQN (used only for DEFINES, not
    /// nominal inheritance).
    pub lexical_parent_fqn: Option<String>,
    /// True for a Method that `LanguageBehavior::is_constructor` recognized
    /// (`__init__`, `constructor`, a class-named method, ...); always false
    /// for Class/Function entities. Lets pass 2 prefer a class's
    /// constructor Method over the Class node itself when resolving a
    /// `new X(...)`/`X(...)` call (§4.7).
    pub is_constructor: bool,
}
