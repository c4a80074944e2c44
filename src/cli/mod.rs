//! Command-line interface: `codegraph init|index|stats`, trimmed from the
//! reference indexer's `Cli`/`Commands` shape down to this pipeline's
//! actual scope (no MCP server, no retrieval queries).

use crate::config::Settings;
use crate::error::IngestResult;
use crate::graph::InMemoryGraphStore;
use crate::indexing::run_ingestion;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "codegraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Walks a source tree and builds a multi-language code graph")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default `.codegraph/settings.toml` in the current directory.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(short, long)]
        force: bool,
    },

    /// Index a repository into the configured graph store.
    Index {
        /// Path to the repository root.
        path: PathBuf,

        /// Number of parser worker threads (overrides config).
        #[arg(short, long)]
        threads: Option<usize>,

        /// Show a progress indicator while indexing.
        #[arg(short, long)]
        progress: bool,
    },

    /// Print the effective configuration.
    Config,
}

/// Dispatches a parsed `Cli` invocation. Returns an exit code the way
/// `main` expects.
pub fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Init { force } => run_init(force),
        Commands::Index { path, threads, progress } => run_index(path, threads, progress),
        Commands::Config => run_config(),
    }
}

fn run_init(force: bool) -> anyhow::Result<i32> {
    let path = PathBuf::from(".codegraph/settings.toml");
    if path.exists() && !force {
        eprintln!("{} already exists (use --force to overwrite)", path.display());
        return Ok(1);
    }
    Settings::default().save(&path)?;
    println!("wrote {}", path.display());
    Ok(0)
}

fn run_config() -> anyhow::Result<i32> {
    let settings = Settings::load()?;
    println!("{}", toml::to_string_pretty(&settings)?);
    Ok(0)
}

fn run_index(path: PathBuf, threads: Option<usize>, progress: bool) -> anyhow::Result<i32> {
    let mut settings = Settings::load().unwrap_or_else(|err| {
        eprintln!("warning: falling back to default configuration ({err})");
        Settings::default()
    });
    settings.repo_root = path;
    if let Some(threads) = threads {
        settings.indexing.worker_count = threads;
    }

    let spinner = progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .expect("static template is valid")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        bar.set_message(format!("indexing {}", settings.repo_root.display()));
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        bar
    });

    let started = Instant::now();
    let store = InMemoryGraphStore::new();
    let result: IngestResult<_> = run_ingestion(&settings, store);
    let elapsed = started.elapsed();

    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }

    let stats = match result {
        Ok(stats) => stats,
        Err(err) => {
            eprintln!("indexing aborted: {err}");
            return Ok(1);
        }
    };

    let mut table = Table::new();
    table.set_header(vec!["metric", "value"]);
    table.add_row(vec![Cell::new("files seen"), Cell::new(stats.files_seen)]);
    table.add_row(vec![Cell::new("files skipped (unsupported)"), Cell::new(stats.files_skipped_unsupported)]);
    table.add_row(vec![Cell::new("files skipped (too large)"), Cell::new(stats.files_skipped_too_large)]);
    table.add_row(vec![Cell::new("files timed out"), Cell::new(stats.files_timed_out)]);
    table.add_row(vec![Cell::new("parse errors"), Cell::new(stats.parse_errors)]);
    table.add_row(vec![Cell::new("resolution misses"), Cell::new(stats.resolution_misses)]);
    table.add_row(vec![Cell::new("ambiguities"), Cell::new(stats.ambiguities)]);
    table.add_row(vec![Cell::new("nodes created"), Cell::new(stats.nodes_created)]);
    table.add_row(vec![Cell::new("edges created"), Cell::new(stats.edges_created)]);
    table.add_row(vec![Cell::new("elapsed"), Cell::new(format!("{:.2?}", elapsed))]);
    println!("{table}");

    Ok(0)
}
