//! The two-pass ingestion core (spec §4.3-§4.8, §5).

pub mod definitions;
pub mod imports;
pub mod inference;
pub mod link;
pub mod pipeline;
pub mod resolver;

pub use pipeline::{run_ingestion, run_ingestion_with_embeddings};
