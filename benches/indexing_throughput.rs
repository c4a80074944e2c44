//! Throughput benchmark for the ingestion pipeline: generates a synthetic
//! tree of Python modules and times a full `run_ingestion` pass against an
//! in-memory store.

use codegraph::graph::InMemoryGraphStore;
use codegraph::{run_ingestion, Settings};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::fs;
use tempfile::TempDir;

fn generate_repo(modules: usize, functions_per_module: usize) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for m in 0..modules {
        let mut source = String::new();
        for f in 0..functions_per_module {
            source.push_str(&format!("def f{f}():\n    pass\n\n"));
        }
        source.push_str("def entry():\n");
        for f in 0..functions_per_module {
            source.push_str(&format!("    f{f}()\n"));
        }
        fs::write(dir.path().join(format!("mod_{m}.py")), source).unwrap();
    }
    dir
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_ingestion");
    group.bench_function("200_modules_20_functions", |b| {
        b.iter_batched(
            || {
                let dir = generate_repo(200, 20);
                let mut settings = Settings::default();
                settings.repo_root = dir.path().to_path_buf();
                (dir, settings)
            },
            |(_dir, settings)| {
                let store = InMemoryGraphStore::new();
                run_ingestion(&settings, store).expect("ingestion run")
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_indexing);
criterion_main!(benches);
