//! Grammar registry (spec §4.2): lazily instantiates and caches one
//! `tree_sitter::Language` grammar per language tag, and hands out fresh
//! `Parser` instances (tree-sitter parsers are not thread-safe; §5 "each
//! worker holds its own parser instance").

use crate::types::Language;
use parking_lot::Mutex;
use std::collections::HashMap;
use tree_sitter::Parser;

fn grammar_for(language: Language) -> Option<tree_sitter::Language> {
    match language {
        Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
        Language::Kotlin => Some(tree_sitter_kotlin_codanna::LANGUAGE.into()),
        Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
        Language::CSharp => Some(tree_sitter_c_sharp::LANGUAGE.into()),
        Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
        Language::C => Some(tree_sitter_c::LANGUAGE.into()),
        Language::Swift => Some(tree_sitter_swift::LANGUAGE.into()),
        Language::Lua => Some(tree_sitter_lua::LANGUAGE.into()),
        Language::Clojure => Some(tree_sitter_clojure_orchard::LANGUAGE.into()),
        Language::GdScript => Some(tree_sitter_gdscript::LANGUAGE.into()),
    }
}

/// Caches loaded grammars; a language tag with no parser available in the
/// process demotes files of that language to "skipped" (§4.2 failure
/// mode), rather than failing the whole run.
#[derive(Default)]
pub struct GrammarRegistry {
    loaded: Mutex<HashMap<Language, Option<tree_sitter::Language>>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn grammar(&self, language: Language) -> Option<tree_sitter::Language> {
        let mut loaded = self.loaded.lock();
        loaded
            .entry(language)
            .or_insert_with(|| grammar_for(language))
            .clone()
    }

    /// True if this registry can actually produce a parser for `language`
    /// in this process.
    pub fn is_available(&self, language: Language) -> bool {
        self.grammar(language).is_some()
    }

    /// A fresh `Parser` configured for `language`. Each caller should own
    /// its instance; do not share one `Parser` across threads.
    pub fn parser_for(&self, language: Language) -> Option<Parser> {
        let grammar = self.grammar(language)?;
        let mut parser = Parser::new();
        parser.set_language(&grammar).ok()?;
        Some(parser)
    }
}
