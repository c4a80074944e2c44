//! Core newtypes shared across the crate: node identity, source ranges,
//! the closed language set and the graph's node/edge kind enums.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Identifies a graph node (Project, Package, Module, Class, Function or
/// Method) for the duration of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(NonZeroU32);

/// Identifies a Module node specifically; most of the pipeline keys its
/// per-file side tables (import mappings, local caches) by `FileId` rather
/// than the more general `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(NonZeroU32);

/// Identifies the Project node created once per ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(NonZeroU32);

impl NodeId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl ProjectId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

/// A source location in line/column coordinates, 0-based, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn contains(&self, line: u32, column: u16) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && column < self.start_column {
            return false;
        }
        if line == self.end_line && column > self.end_column {
            return false;
        }
        true
    }
}

/// The closed set of languages the grammar registry knows how to parse.
/// §4.1: "a fixed closed set covering the languages the parsers support."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    Kotlin,
    Php,
    CSharp,
    Cpp,
    C,
    Swift,
    Lua,
    Clojure,
    GdScript,
}

impl Language {
    pub const ALL: &'static [Language] = &[
        Language::Rust,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Go,
        Language::Java,
        Language::Kotlin,
        Language::Php,
        Language::CSharp,
        Language::Cpp,
        Language::C,
        Language::Swift,
        Language::Lua,
        Language::Clojure,
        Language::GdScript,
    ];

    /// Extensions recognized for this language. A file whose extension maps
    /// to none of these is skipped by the classifier (§4.1).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::Kotlin => &["kt", "kts"],
            Language::Php => &["php", "php3", "php4", "php5", "php7", "php8", "phtml"],
            Language::CSharp => &["cs"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
            Language::C => &["c", "h"],
            Language::Swift => &["swift"],
            Language::Lua => &["lua"],
            Language::Clojure => &["clj", "cljs", "cljc"],
            Language::GdScript => &["gd"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext_lower = ext.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext_lower.as_str()))
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn config_key(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Php => "php",
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Swift => "swift",
            Language::Lua => "lua",
            Language::Clojure => "clojure",
            Language::GdScript => "gdscript",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Go => "Go",
            Language::Java => "Java",
            Language::Kotlin => "Kotlin",
            Language::Php => "PHP",
            Language::CSharp => "C#",
            Language::Cpp => "C++",
            Language::C => "C",
            Language::Swift => "Swift",
            Language::Lua => "Lua",
            Language::Clojure => "Clojure",
            Language::GdScript => "GDScript",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Node labels in the graph's data model (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Project,
    Package,
    Module,
    Class,
    Function,
    Method,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Project => "Project",
            NodeKind::Package => "Package",
            NodeKind::Module => "Module",
            NodeKind::Class => "Class",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
        }
    }

    /// Whether a node of this kind can be the target of a CALLS edge
    /// (§3 CALLS: "targets always reference nodes that exist"; §8 property 3).
    pub fn is_callable_target(&self) -> bool {
        matches!(
            self,
            NodeKind::Function | NodeKind::Method | NodeKind::Class
        )
    }
}

/// Edge kinds in the graph's data model (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    ContainsPackage,
    ContainsModule,
    Defines,
    Inherits,
    Implements,
    Imports,
    Calls,
}

impl EdgeKind {
    pub fn label(&self) -> &'static str {
        match self {
            EdgeKind::ContainsPackage => "CONTAINS_PACKAGE",
            EdgeKind::ContainsModule => "CONTAINS_MODULE",
            EdgeKind::Defines => "DEFINES",
            EdgeKind::Inherits => "INHERITS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Calls => "CALLS",
        }
    }
}

/// A small immutable string; entity names and FQNs are write-once.
pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

/// The single separator used to join FQN segments, language-independent
/// (GLOSSARY: FQN).
pub const FQN_SEPARATOR: char = '.';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_rejects_zero() {
        assert!(NodeId::new(0).is_none());
        assert_eq!(NodeId::new(7).unwrap().value(), 7);
    }

    #[test]
    fn range_contains_is_inclusive_at_edges() {
        let r = Range::new(10, 5, 15, 20);
        assert!(r.contains(10, 5));
        assert!(r.contains(15, 20));
        assert!(!r.contains(9, 10));
        assert!(!r.contains(16, 0));
        assert!(!r.contains(10, 4));
        assert!(!r.contains(15, 21));
    }

    #[test]
    fn language_from_extension_is_case_insensitive() {
        assert_eq!(Language::from_extension("RS"), Some(Language::Rust));
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("txt"), None);
    }

    #[test]
    fn language_from_path() {
        assert_eq!(
            Language::from_path(std::path::Path::new("src/main.rs")),
            Some(Language::Rust)
        );
        assert_eq!(
            Language::from_path(std::path::Path::new("types.d.ts")),
            Some(Language::TypeScript)
        );
        assert_eq!(
            Language::from_path(std::path::Path::new("README.md")),
            None
        );
    }

    #[test]
    fn callable_target_kinds() {
        assert!(NodeKind::Function.is_callable_target());
        assert!(NodeKind::Method.is_callable_target());
        assert!(NodeKind::Class.is_callable_target());
        assert!(!NodeKind::Module.is_callable_target());
    }
}
