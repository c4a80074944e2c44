//! An in-memory `GraphStore`, grounded on the reference indexer's
//! petgraph-based `DependencyGraph`. Used by the test suite and as the
//! default local backend when no remote store is configured.

use crate::graph::model::{EdgeWrite, NodeDescriptor, NodeWrite, Props};
use crate::graph::store::{GraphStore, StoreResult};
use crate::types::EdgeKind;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct StoredEdge {
    pub kind: EdgeKind,
}

/// A single-process property graph backed by `petgraph`. Idempotent per
/// the §4.8 contract: re-merging a known descriptor updates its props,
/// re-merging a known edge is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    graph: DiGraph<NodeDescriptor, StoredEdge>,
    node_index: HashMap<NodeDescriptor, NodeIndex>,
    props: HashMap<NodeDescriptor, Props>,
    edge_set: std::collections::HashSet<(NodeDescriptor, EdgeKind, NodeDescriptor)>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_index(&mut self, descriptor: &NodeDescriptor) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(descriptor) {
            return idx;
        }
        let idx = self.graph.add_node(descriptor.clone());
        self.node_index.insert(descriptor.clone(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_set.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.node_index.keys()
    }

    pub fn props_of(&self, descriptor: &NodeDescriptor) -> Option<&Props> {
        self.props.get(descriptor)
    }

    /// Outgoing edges of `descriptor` filtered to `kind`, in insertion
    /// order is not guaranteed (petgraph adjacency order).
    pub fn outgoing(&self, descriptor: &NodeDescriptor, kind: EdgeKind) -> Vec<NodeDescriptor> {
        let Some(&idx) = self.node_index.get(descriptor) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .filter(|e| e.weight().kind == kind)
            .filter_map(|e| self.graph.node_weight(e.target()).cloned())
            .collect()
    }

    pub fn incoming(&self, descriptor: &NodeDescriptor, kind: EdgeKind) -> Vec<NodeDescriptor> {
        let Some(&idx) = self.node_index.get(descriptor) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter(|e| e.weight().kind == kind)
            .filter_map(|e| self.graph.node_weight(e.source()).cloned())
            .collect()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn merge_nodes(&mut self, nodes: &[NodeWrite]) -> StoreResult<()> {
        for node in nodes {
            self.ensure_index(&node.descriptor);
            self.props
                .entry(node.descriptor.clone())
                .or_default()
                .extend(node.props.clone());
        }
        Ok(())
    }

    fn merge_relationships(&mut self, edges: &[EdgeWrite]) -> StoreResult<()> {
        for edge in edges {
            let key = (edge.src.clone(), edge.kind, edge.dst.clone());
            if self.edge_set.contains(&key) {
                continue;
            }
            let src_idx = self.ensure_index(&edge.src);
            let dst_idx = self.ensure_index(&edge.dst);
            self.graph
                .add_edge(src_idx, dst_idx, StoredEdge { kind: edge.kind });
            self.edge_set.insert(key);
        }
        Ok(())
    }

    fn node_exists(&self, descriptor: &NodeDescriptor) -> bool {
        self.node_index.contains_key(descriptor)
    }

    fn delete_project(&mut self, project_root_path: &str) -> StoreResult<()> {
        let project_descriptor = NodeDescriptor::project(project_root_path);
        if let Some(idx) = self.node_index.remove(&project_descriptor) {
            self.graph.remove_node(idx);
        }
        Ok(())
    }
}
