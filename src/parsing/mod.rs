//! Parsing layer: grammar loading, per-language behavior, and file
//! classification/traversal (spec §4.1, §4.2, §4.4).

pub mod behavior;
pub mod families;
pub mod grammar;
pub mod walker;

pub use behavior::{ImportForm, LanguageBehavior};
pub use families::behavior_for;
pub use grammar::GrammarRegistry;
pub use walker::{ClassifiedFile, FileWalker, SkipReason, SkippedFile};

use crate::types::Language;
use tree_sitter::Tree;

/// A parsed file: its source text, syntax tree, and the behavior table used
/// to interpret it. Pass 1 and pass 2 both consume this (§5).
pub struct ParsedFile {
    pub path: std::path::PathBuf,
    pub language: Language,
    pub source: String,
    pub tree: Tree,
}

/// Parses one file's contents; returns `None` when the grammar isn't
/// available or the parse produced no tree (§4.2 failure mode — demoted to
/// a skip, not a fatal error).
pub fn parse_file(
    registry: &GrammarRegistry,
    path: std::path::PathBuf,
    language: Language,
    source: String,
) -> Option<ParsedFile> {
    parse_file_with_timeout(registry, path, language, source, 0)
}

/// Same as `parse_file`, but aborts the parse after `timeout_micros`
/// microseconds of wall-clock time (0 disables the timeout). A timed-out
/// parse returns `None` and the caller records a `files_timed_out` skip
/// rather than treating it as fatal (§5 "parse of a single file has a
/// wall-clock timeout, default 30s").
pub fn parse_file_with_timeout(
    registry: &GrammarRegistry,
    path: std::path::PathBuf,
    language: Language,
    source: String,
    timeout_micros: u64,
) -> Option<ParsedFile> {
    let mut parser = registry.parser_for(language)?;
    if timeout_micros > 0 {
        parser.set_timeout_micros(timeout_micros);
    }
    let tree = parser.parse(&source, None)?;
    Some(ParsedFile {
        path,
        language,
        source,
        tree,
    })
}
