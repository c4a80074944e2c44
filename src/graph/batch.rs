//! Bounded batch writer in front of a `GraphStore` (spec §4.8).

use crate::error::{IngestError, IngestResult};
use crate::graph::model::{EdgeWrite, NodeWrite};
use crate::graph::store::{GraphStore, StoreError};
use std::thread;
use std::time::Duration;

const MAX_FLUSH_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 50;

/// Buffers node/edge writes and flushes in bounded batches, matching the
/// `ensure_node_batch` / `ensure_relationship_batch` / `flush` / `close`
/// contract in §4.8.
pub struct BatchIngestor<S: GraphStore> {
    store: S,
    batch_size: usize,
    pending_nodes: Vec<NodeWrite>,
    pending_edges: Vec<EdgeWrite>,
    nodes_flushed: u64,
    edges_flushed: u64,
}

impl<S: GraphStore> BatchIngestor<S> {
    pub fn new(store: S, batch_size: usize) -> Self {
        assert!(batch_size >= 1, "batch_size must be >= 1 per spec §6");
        Self {
            store,
            batch_size,
            pending_nodes: Vec::new(),
            pending_edges: Vec::new(),
            nodes_flushed: 0,
            edges_flushed: 0,
        }
    }

    pub fn nodes_flushed(&self) -> u64 {
        self.nodes_flushed
    }

    pub fn edges_flushed(&self) -> u64 {
        self.edges_flushed
    }

    pub fn ensure_node_batch(&mut self, node: NodeWrite) -> IngestResult<()> {
        self.pending_nodes.push(node);
        if self.pending_nodes.len() >= self.batch_size {
            self.flush_nodes()?;
        }
        Ok(())
    }

    pub fn ensure_relationship_batch(&mut self, edge: EdgeWrite) -> IngestResult<()> {
        self.pending_edges.push(edge);
        if self.pending_edges.len() >= self.batch_size {
            self.flush_edges()?;
        }
        Ok(())
    }

    /// Flush every pending buffer (§4.8 "flush on overflow and on
    /// `close()`").
    pub fn flush(&mut self) -> IngestResult<()> {
        self.flush_nodes()?;
        self.flush_edges()?;
        Ok(())
    }

    /// Final synchronous flush at end of run (§2 step 8). Idempotent: safe
    /// to call more than once.
    pub fn close(&mut self) -> IngestResult<()> {
        self.flush()
    }

    fn flush_nodes(&mut self) -> IngestResult<()> {
        if self.pending_nodes.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending_nodes);
        let count = batch.len() as u64;
        with_retry(|| self.store.merge_nodes(&batch))?;
        self.nodes_flushed += count;
        Ok(())
    }

    fn flush_edges(&mut self) -> IngestResult<()> {
        if self.pending_edges.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending_edges);
        let count = batch.len() as u64;
        with_retry(|| self.store.merge_relationships(&batch))?;
        self.edges_flushed += count;
        Ok(())
    }
}

/// Retries a transient store failure with exponential backoff up to
/// `MAX_FLUSH_ATTEMPTS`; a fatal failure aborts immediately (§7
/// ingestor-transient vs ingestor-fatal).
fn with_retry(mut op: impl FnMut() -> Result<(), StoreError>) -> IngestResult<()> {
    let mut attempt = 0;
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
    loop {
        match op() {
            Ok(()) => return Ok(()),
            Err(StoreError::Fatal(reason)) => {
                return Err(IngestError::IngestorFatal { reason });
            }
            Err(StoreError::Transient(reason)) => {
                attempt += 1;
                if attempt >= MAX_FLUSH_ATTEMPTS {
                    return Err(IngestError::IngestorTransientExhausted {
                        attempts: attempt,
                        reason,
                    });
                }
                thread::sleep(backoff);
                backoff *= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{NodeBuilder};
    use crate::graph::store::StoreResult;
    use std::cell::RefCell;

    /// A store double that fails transiently N times before succeeding,
    /// or fails fatally, to exercise the retry/backoff and abort paths.
    struct FlakyStore {
        remaining_transient_failures: RefCell<u32>,
        fatal: bool,
        merged_nodes: RefCell<usize>,
    }

    impl GraphStore for FlakyStore {
        fn merge_nodes(&mut self, nodes: &[NodeWrite]) -> StoreResult<()> {
            if self.fatal {
                return Err(StoreError::Fatal("schema mismatch".into()));
            }
            let mut remaining = self.remaining_transient_failures.borrow_mut();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Transient("connection reset".into()));
            }
            *self.merged_nodes.borrow_mut() += nodes.len();
            Ok(())
        }

        fn merge_relationships(&mut self, _edges: &[EdgeWrite]) -> StoreResult<()> {
            Ok(())
        }

        fn node_exists(&self, _descriptor: &crate::graph::model::NodeDescriptor) -> bool {
            false
        }

        fn delete_project(&mut self, _project_root_path: &str) -> StoreResult<()> {
            Ok(())
        }
    }

    #[test]
    fn flushes_on_batch_size_overflow() {
        let store = FlakyStore {
            remaining_transient_failures: RefCell::new(0),
            fatal: false,
            merged_nodes: RefCell::new(0),
        };
        let mut ingestor = BatchIngestor::new(store, 2);
        ingestor
            .ensure_node_batch(NodeBuilder::package("a", "a"))
            .unwrap();
        assert_eq!(ingestor.nodes_flushed(), 0);
        ingestor
            .ensure_node_batch(NodeBuilder::package("b", "b"))
            .unwrap();
        assert_eq!(ingestor.nodes_flushed(), 2);
    }

    #[test]
    fn close_flushes_partial_batch() {
        let store = FlakyStore {
            remaining_transient_failures: RefCell::new(0),
            fatal: false,
            merged_nodes: RefCell::new(0),
        };
        let mut ingestor = BatchIngestor::new(store, 100);
        ingestor
            .ensure_node_batch(NodeBuilder::package("a", "a"))
            .unwrap();
        assert_eq!(ingestor.nodes_flushed(), 0);
        ingestor.close().unwrap();
        assert_eq!(ingestor.nodes_flushed(), 1);
    }

    #[test]
    fn retries_transient_failures_then_succeeds() {
        let store = FlakyStore {
            remaining_transient_failures: RefCell::new(2),
            fatal: false,
            merged_nodes: RefCell::new(0),
        };
        let mut ingestor = BatchIngestor::new(store, 1);
        ingestor
            .ensure_node_batch(NodeBuilder::package("a", "a"))
            .unwrap();
        assert_eq!(ingestor.nodes_flushed(), 1);
    }

    #[test]
    fn fatal_failure_aborts_without_retry() {
        let store = FlakyStore {
            remaining_transient_failures: RefCell::new(0),
            fatal: true,
            merged_nodes: RefCell::new(0),
        };
        let mut ingestor = BatchIngestor::new(store, 1);
        let result = ingestor.ensure_node_batch(NodeBuilder::package("a", "a"));
        assert!(matches!(result, Err(IngestError::IngestorFatal { .. })));
    }

    #[test]
    fn persistent_transient_failure_exhausts_retries() {
        let store = FlakyStore {
            remaining_transient_failures: RefCell::new(100),
            fatal: false,
            merged_nodes: RefCell::new(0),
        };
        let mut ingestor = BatchIngestor::new(store, 1);
        let result = ingestor.ensure_node_batch(NodeBuilder::package("a", "a"));
        assert!(matches!(
            result,
            Err(IngestError::IngestorTransientExhausted { .. })
        ));
    }
}
