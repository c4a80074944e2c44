//! Layered configuration (spec §6).
//!
//! Defaults → `.codegraph/settings.toml` → `CODEGRAPH_`-prefixed environment
//! variables → CLI flags (applied by `cli::apply_overrides`), in that order,
//! using `figment` the same way the reference indexer's `config.rs` does.
//!
//! # Environment variables
//!
//! `CODEGRAPH_INDEXING__WORKER_COUNT=8` sets `indexing.worker_count`;
//! double underscore separates nesting levels.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// §6 `repo_root`.
    #[serde(default = "default_repo_root")]
    pub repo_root: PathBuf,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub embeddings: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// §6 `batch_size`.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// §6 `worker_count`.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// §6 `max_file_bytes`.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// §6 `call_chain_depth`.
    #[serde(default = "default_call_chain_depth")]
    pub call_chain_depth: usize,

    /// §5 "parse of a single file has a wall-clock timeout (default 30s)".
    #[serde(default = "default_parse_timeout_secs")]
    pub parse_timeout_secs: u64,

    /// Ignore-file style patterns layered on top of `.gitignore` (§4.1).
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Explicit include globs; when non-empty, a file must match one of
    /// these *and* not be ignored (§4.1 "explicit include/exclude globs").
    #[serde(default)]
    pub include_globs: Vec<String>,

    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// §6 `embeddings_enabled`.
    #[serde(default = "default_false")]
    pub enabled: bool,
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_vector_collection")]
    pub collection_name: String,
}

fn default_version() -> u32 {
    1
}
fn default_repo_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_batch_size() -> usize {
    1000
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}
fn default_call_chain_depth() -> usize {
    3
}
fn default_parse_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_embedding_batch_size() -> usize {
    32
}
fn default_vector_collection() -> String {
    "codegraph_snippets".to_string()
}
fn default_ignore_patterns() -> Vec<String> {
    vec![
        "target/**".to_string(),
        "node_modules/**".to_string(),
        ".git/**".to_string(),
        "dist/**".to_string(),
        "build/**".to_string(),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            repo_root: default_repo_root(),
            indexing: IndexingConfig::default(),
            languages: default_languages(),
            logging: LoggingConfig::default(),
            embeddings: EmbeddingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            worker_count: default_worker_count(),
            max_file_bytes: default_max_file_bytes(),
            call_chain_depth: default_call_chain_depth(),
            parse_timeout_secs: default_parse_timeout_secs(),
            ignore_patterns: default_ignore_patterns(),
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: default_false(),
            batch_size: default_embedding_batch_size(),
            collection_name: default_vector_collection(),
        }
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    crate::types::Language::ALL
        .iter()
        .map(|lang| (lang.config_key().to_string(), LanguageConfig { enabled: true }))
        .collect()
}

impl Settings {
    /// Load configuration from all sources (§6). Searches ancestors of the
    /// current directory for a `.codegraph/settings.toml`, falling back to
    /// pure defaults plus environment overrides when none exists.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".codegraph/settings.toml"));
        Self::load_from(config_path)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CODEGRAPH_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
    }

    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".codegraph");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }
        None
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn enabled_languages(&self) -> Vec<crate::types::Language> {
        crate::types::Language::ALL
            .iter()
            .copied()
            .filter(|lang| {
                self.languages
                    .get(lang.config_key())
                    .map(|c| c.enabled)
                    .unwrap_or(true)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_have_sane_values() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.indexing.worker_count > 0);
        assert_eq!(settings.indexing.batch_size, 1000);
        assert!(settings.languages.contains_key("rust"));
    }

    #[test]
    fn load_from_toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[indexing]
batch_size = 50
worker_count = 2
call_chain_depth = 5

[languages.python]
enabled = false
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.indexing.batch_size, 50);
        assert_eq!(settings.indexing.worker_count, 2);
        assert_eq!(settings.indexing.call_chain_depth, 5);
        assert!(!settings.languages["python"].enabled);
        // untouched defaults survive
        assert_eq!(settings.indexing.max_file_bytes, default_max_file_bytes());
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[indexing]\nbatch_size = 50\n").unwrap();

        unsafe {
            std::env::set_var("CODEGRAPH_INDEXING__BATCH_SIZE", "77");
        }
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.indexing.batch_size, 77);
        unsafe {
            std::env::remove_var("CODEGRAPH_INDEXING__BATCH_SIZE");
        }
    }

    #[test]
    fn enabled_languages_respects_config() {
        let mut settings = Settings::default();
        settings
            .languages
            .get_mut("python")
            .unwrap()
            .enabled = false;
        let enabled = settings.enabled_languages();
        assert!(!enabled.contains(&crate::types::Language::Python));
        assert!(enabled.contains(&crate::types::Language::Rust));
    }
}
