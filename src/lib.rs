//! `codegraph`: a multi-language code-graph ingestion pipeline. Walks a
//! source tree, classifies files by language, parses them with tree-sitter
//! grammars, extracts structural entities into a uniform node/edge model,
//! resolves cross-file references, and batches the result into an external
//! graph store (SPEC_FULL.md §A-§D).

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod logging;
pub mod parsing;
pub mod registry;
pub mod types;
pub mod vector;

pub use config::Settings;
pub use error::{IngestError, IngestResult, LocalErrorKind, RunStats};
pub use graph::{GraphStore, InMemoryGraphStore};
pub use indexing::run_ingestion;
pub use types::{EdgeKind, FileId, Language, NodeKind, ProjectId};
