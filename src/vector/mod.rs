//! The optional embedding pipeline (spec §4.9): for every Function and
//! Method node, extracts its source snippet, submits it to an embedding
//! model in mini-batches, and upserts `(node_id, vector, qualified_name)`
//! into a vector index. Strictly additive — a failure here is logged and
//! swallowed, never propagated as an `IngestError` (§4.9 "a failure here
//! does not affect the graph").
//!
//! `EmbeddingClient` and `VectorIndex` are external collaborators, mirrored
//! on the same shape as `graph::store::GraphStore`: the core only depends
//! on the trait, never a concrete backend.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("embedding model call failed: {0}")]
    ModelFailure(String),
}

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("vector index upsert failed: {0}")]
    UpsertFailure(String),
}

/// One Function/Method node's extracted source snippet, ready for
/// embedding (§4.9 step 1: "Extracts source-byte slice by
/// `[start_line, end_line]`").
#[derive(Debug, Clone)]
pub struct Snippet {
    pub node_id: u32,
    pub qualified_name: String,
    pub text: String,
}

/// A single embedded record ready for the vector index (§4.9 step 3).
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub node_id: u32,
    pub qualified_name: String,
    pub vector: Vec<f32>,
}

/// Submits text in mini-batches and returns one vector per input text, in
/// order. Implementations own model lifecycle and threading.
pub trait EmbeddingClient: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The fixed dimension this client's vectors use (§6 "fixed vector
    /// dimension").
    fn dimension(&self) -> usize;
}

/// Upsert-by-integer-id store with a fixed vector dimension and top-k
/// cosine search (§6 "Vector index").
pub trait VectorIndex: Send + Sync {
    fn upsert(&mut self, records: &[VectorRecord]) -> Result<(), VectorIndexError>;

    /// Top-k nearest neighbors to `query` by cosine similarity.
    fn search(&self, query: &[f32], k: usize) -> Vec<(u32, f32)>;
}

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 100;

/// Per-run counters for the embedding pipeline, surfaced separately from
/// `RunStats` since an embedding failure never affects `had_fatal_error`.
#[derive(Debug, Default, Clone)]
pub struct EmbeddingStats {
    pub snippets_submitted: u64,
    pub vectors_stored: u64,
    pub batches_failed: u64,
}

/// Runs the embedding pipeline over `snippets`, batching by `batch_size`
/// (§4.9, §6 `embeddings_enabled`). Each batch failure is retried with
/// exponential backoff; a batch that exhausts its retries is skipped and
/// counted, never aborts the run.
pub fn run_embedding_pipeline(
    snippets: &[Snippet],
    client: &dyn EmbeddingClient,
    index: &mut dyn VectorIndex,
    batch_size: usize,
) -> EmbeddingStats {
    let mut stats = EmbeddingStats::default();
    let batch_size = batch_size.max(1);

    for chunk in snippets.chunks(batch_size) {
        stats.snippets_submitted += chunk.len() as u64;
        match embed_with_retry(client, chunk) {
            Ok(vectors) => {
                let records: Vec<VectorRecord> = chunk
                    .iter()
                    .zip(vectors)
                    .map(|(snippet, vector)| VectorRecord {
                        node_id: snippet.node_id,
                        qualified_name: snippet.qualified_name.clone(),
                        vector,
                    })
                    .collect();
                match index.upsert(&records) {
                    Ok(()) => stats.vectors_stored += records.len() as u64,
                    Err(err) => {
                        tracing::warn!(error = %err, "vector index upsert failed, batch dropped");
                        stats.batches_failed += 1;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "embedding batch exhausted retries, batch dropped");
                stats.batches_failed += 1;
            }
        }
    }

    stats
}

fn embed_with_retry(client: &dyn EmbeddingClient, chunk: &[Snippet]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let texts: Vec<String> = chunk.iter().map(|s| s.text.clone()).collect();
    let mut attempt = 0;
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
    loop {
        match client.embed_batch(&texts) {
            Ok(vectors) => return Ok(vectors),
            Err(err) => {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    return Err(err);
                }
                std::thread::sleep(backoff);
                backoff *= 2;
            }
        }
    }
}

/// Extracts the `[start_line, end_line]` source slice for a node (§4.9
/// step 1). Lines are 0-based, inclusive on both ends, matching `Range`.
pub fn extract_snippet(source: &str, start_line: u32, end_line: u32) -> String {
    source
        .lines()
        .skip(start_line as usize)
        .take((end_line as usize).saturating_sub(start_line as usize) + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(feature = "embeddings")]
pub mod fastembed_client {
    //! Default `EmbeddingClient` backed by `fastembed`'s local ONNX runtime,
    //! grounded on the reference indexer's `SimpleSemanticSearch` (wraps the
    //! model in a `Mutex` since `TextEmbedding::embed` takes `&mut self`).

    use super::{EmbeddingClient, EmbeddingError};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    pub struct FastEmbedClient {
        model: Mutex<TextEmbedding>,
        dimension: usize,
    }

    impl FastEmbedClient {
        pub fn new() -> Result<Self, EmbeddingError> {
            let mut model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
            )
            .map_err(|e| EmbeddingError::ModelFailure(e.to_string()))?;
            let probe = model
                .embed(vec!["probe"], None)
                .map_err(|e| EmbeddingError::ModelFailure(e.to_string()))?;
            let dimension = probe.into_iter().next().map(|v| v.len()).unwrap_or(0);
            Ok(Self {
                model: Mutex::new(model),
                dimension,
            })
        }
    }

    impl EmbeddingClient for FastEmbedClient {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let owned: Vec<String> = texts.to_vec();
            self.model
                .lock()
                .expect("embedding model mutex poisoned")
                .embed(owned, None)
                .map_err(|e| EmbeddingError::ModelFailure(e.to_string()))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}
