//! File classifier and traversal (spec §4.1).
//!
//! Produces a deterministic, lexicographically ordered stream of
//! `(path, language)` pairs so that repeated runs over the same repo yield
//! identical FQNs and registry contents (§4.1, §8 property 4).

use crate::config::Settings;
use crate::types::Language;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub path: PathBuf,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedExtension,
    TooLarge,
    LanguageDisabled,
}

pub struct FileWalker<'a> {
    settings: &'a Settings,
}

impl<'a> FileWalker<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Walk `root`, honoring `.gitignore`-style rules plus the
    /// configured ignore/include/exclude globs, pruning hidden and
    /// vendored directories *at walk time* (§4.1 "pruned at walk time, not
    /// filtered after enumeration"), following symlinks at most once by
    /// canonicalizing paths to break cycles, and returning results sorted
    /// lexicographically by path so FQN assignment is deterministic.
    pub fn walk(&self, root: &Path) -> (Vec<ClassifiedFile>, Vec<SkippedFile>) {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true) // prune leading-dot directories at walk time
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(true) // combined with canonicalize-based cycle breaking below
            .require_git(false);

        let mut overrides = OverrideBuilder::new(root);
        for pattern in &self.settings.indexing.ignore_patterns {
            let _ = overrides.add(&format!("!{pattern}"));
        }
        for pattern in &self.settings.indexing.exclude_globs {
            let _ = overrides.add(&format!("!{pattern}"));
        }
        for pattern in &self.settings.indexing.include_globs {
            let _ = overrides.add(pattern);
        }
        if let Ok(built) = overrides.build() {
            builder.overrides(built);
        }

        let enabled: HashSet<Language> = self.settings.enabled_languages().into_iter().collect();
        let max_bytes = self.settings.indexing.max_file_bytes;

        let mut visited_real_paths = HashSet::new();
        let mut classified = Vec::new();
        let mut skipped = Vec::new();

        for entry in builder.build().filter_map(Result::ok) {
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();

            // Break symlink cycles: canonicalize and track visited real paths.
            match path.canonicalize() {
                Ok(real) => {
                    if !visited_real_paths.insert(real) {
                        continue;
                    }
                }
                Err(_) => continue,
            }

            let Some(language) = Language::from_path(path) else {
                skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason: SkipReason::UnsupportedExtension,
                });
                continue;
            };

            if !enabled.contains(&language) {
                skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason: SkipReason::LanguageDisabled,
                });
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > max_bytes {
                skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason: SkipReason::TooLarge,
                });
                continue;
            }

            classified.push(ClassifiedFile {
                path: path.to_path_buf(),
                language,
            });
        }

        classified.sort_by(|a, b| a.path.cmp(&b.path));
        skipped.sort_by(|a, b| a.path.cmp(&b.path));
        (classified, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn classifies_supported_files_and_skips_others() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        std::fs::write(dir.path().join("README.md"), "# hi").unwrap();

        let settings = settings();
        let walker = FileWalker::new(&settings);
        let (classified, skipped) = walker.walk(dir.path());

        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].language, Language::Rust);
        assert!(skipped
            .iter()
            .any(|s| s.reason == SkipReason::UnsupportedExtension));
    }

    #[test]
    fn ordering_is_deterministic_and_lexicographic() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.py"), "").unwrap();
        std::fs::write(dir.path().join("a.py"), "").unwrap();
        std::fs::write(dir.path().join("c.py"), "").unwrap();

        let settings = settings();
        let walker = FileWalker::new(&settings);
        let (classified, _) = walker.walk(dir.path());
        let names: Vec<_> = classified
            .iter()
            .map(|c| c.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.py", "b.py", "c.py"]);
    }

    #[test]
    fn hidden_directories_are_pruned() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join(".hidden/inner.rs"), "").unwrap();
        std::fs::write(dir.path().join("visible.rs"), "").unwrap();

        let settings = settings();
        let walker = FileWalker::new(&settings);
        let (classified, _) = walker.walk(dir.path());
        assert_eq!(classified.len(), 1);
        assert!(classified[0].path.ends_with("visible.rs"));
    }

    #[test]
    fn gitignore_patterns_are_respected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "ignored.rs\n").unwrap();
        std::fs::write(dir.path().join("ignored.rs"), "").unwrap();
        std::fs::write(dir.path().join("kept.rs"), "").unwrap();

        let settings = settings();
        let walker = FileWalker::new(&settings);
        let (classified, _) = walker.walk(dir.path());
        assert_eq!(classified.len(), 1);
        assert!(classified[0].path.ends_with("kept.rs"));
    }

    #[test]
    fn oversized_files_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.rs"), "x".repeat(100)).unwrap();

        let mut settings = settings();
        settings.indexing.max_file_bytes = 10;
        let walker = FileWalker::new(&settings);
        let (classified, skipped) = walker.walk(dir.path());
        assert!(classified.is_empty());
        assert_eq!(skipped[0].reason, SkipReason::TooLarge);
    }
}
