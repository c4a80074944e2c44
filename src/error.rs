//! Error kinds for the ingestion pipeline (spec §7).
//!
//! `spec.md` describes error *kinds*, not necessarily Rust error *types*:
//! most of them are local to one file or call site and only need to be
//! counted, not propagated. `IngestError` covers the few that do propagate
//! (ingestor-fatal, internal I/O); `RunStats` is the counter struct the
//! orchestrator accumulates and prints at the end of a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the run (§7: "surface to the orchestrator and
/// terminate the run").
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read repository root '{path}': {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("graph store write failed after {attempts} attempts: {reason}")]
    IngestorTransientExhausted { attempts: u32, reason: String },

    #[error("graph store rejected write: {reason}")]
    IngestorFatal { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

pub type IngestResult<T> = Result<T, IngestError>;

/// A *local* error kind: affects one file or one call site and does not
/// stop the pipeline (§7 propagation policy). These are recorded in
/// `RunStats` rather than returned as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalErrorKind {
    ParseError,
    ResolutionMiss,
    Ambiguity,
    OverLimit,
    InternalInvariant,
}

impl LocalErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            LocalErrorKind::ParseError => "parse-error",
            LocalErrorKind::ResolutionMiss => "resolution-miss",
            LocalErrorKind::Ambiguity => "ambiguity",
            LocalErrorKind::OverLimit => "over-limit",
            LocalErrorKind::InternalInvariant => "internal-invariant",
        }
    }
}

/// Per-run counters for every local error kind, plus basic throughput
/// counts. Printed as the "final summary" §7 requires on both success and
/// non-zero exit.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub files_seen: u64,
    pub files_skipped_unsupported: u64,
    pub files_skipped_too_large: u64,
    pub files_timed_out: u64,
    pub parse_errors: u64,
    pub resolution_misses: u64,
    pub ambiguities: u64,
    pub internal_invariants: u64,
    pub nodes_created: u64,
    pub edges_created: u64,
}

impl RunStats {
    pub fn record(&mut self, kind: LocalErrorKind) {
        match kind {
            LocalErrorKind::ParseError => self.parse_errors += 1,
            LocalErrorKind::ResolutionMiss => self.resolution_misses += 1,
            LocalErrorKind::Ambiguity => self.ambiguities += 1,
            LocalErrorKind::OverLimit => self.files_skipped_too_large += 1,
            LocalErrorKind::InternalInvariant => self.internal_invariants += 1,
        }
    }

    /// Whether this run should exit non-zero. Local errors alone never do;
    /// only an `IngestError` surfacing to the orchestrator does. Exposed so
    /// the CLI can decide after a run that finished via local-error
    /// recovery alone (never actually hit an abort) still exits 0.
    pub fn had_fatal_error(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_increments_matching_counter() {
        let mut stats = RunStats::default();
        stats.record(LocalErrorKind::ResolutionMiss);
        stats.record(LocalErrorKind::ResolutionMiss);
        stats.record(LocalErrorKind::Ambiguity);
        assert_eq!(stats.resolution_misses, 2);
        assert_eq!(stats.ambiguities, 1);
        assert_eq!(stats.parse_errors, 0);
    }

    #[test]
    fn local_errors_are_not_fatal() {
        let mut stats = RunStats::default();
        stats.record(LocalErrorKind::ParseError);
        stats.record(LocalErrorKind::InternalInvariant);
        assert!(!stats.had_fatal_error());
    }
}
