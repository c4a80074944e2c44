//! The interface the core consumes from the graph-store collaborator
//! (spec §4.8, §6). The store itself — a labeled-property-graph endpoint
//! accepting parameterized queries — is out of scope; this crate only
//! defines and exercises the trait.

use crate::graph::model::{EdgeWrite, NodeDescriptor, NodeWrite};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("transient write failure: {0}")]
    Transient(String),
    #[error("fatal store failure: {0}")]
    Fatal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the ingestion core requires of the remote graph store.
/// §6: "MERGE node by (label, key)", "MERGE relationship by (src, type,
/// dst)", "SET properties", "DELETE subgraph by project label" — all
/// writes parameterized, no string interpolation of identifiers.
pub trait GraphStore: Send + Sync {
    /// `MERGE` a batch of nodes by their descriptor key; re-emitting an
    /// existing key updates its properties (§4.8 idempotence).
    fn merge_nodes(&mut self, nodes: &[NodeWrite]) -> StoreResult<()>;

    /// `MERGE` a batch of relationships by `(src, type, dst)`; re-emitting
    /// an existing relationship is a no-op at the store level.
    fn merge_relationships(&mut self, edges: &[EdgeWrite]) -> StoreResult<()>;

    /// Whether a node with this descriptor already exists. Used by the
    /// link phase to check candidate INHERITS/IMPLEMENTS targets exist
    /// before emitting the edge (§3 invariant 5 analog for inheritance).
    fn node_exists(&self, descriptor: &NodeDescriptor) -> bool;

    /// Delete every node/edge belonging to one project (§6 "DELETE
    /// subgraph by project label"). Delegated entirely to the store;
    /// the core never calls this during a normal ingestion run (§3
    /// "Deletion semantics... are delegated to the external graph store").
    fn delete_project(&mut self, project_root_path: &str) -> StoreResult<()>;
}
