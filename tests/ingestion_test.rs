//! End-to-end ingestion tests covering the testable properties and S1/S6
//! scenarios.

use codegraph::graph::{EdgeWrite, GraphStore, InMemoryGraphStore, NodeDescriptor, NodeWrite, StoreResult};
use codegraph::types::{EdgeKind, NodeKind};
use codegraph::{run_ingestion, Settings};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A `GraphStore` that keeps a shared handle to its backing
/// `InMemoryGraphStore` so the test can inspect it after `run_ingestion`
/// takes ownership of the store argument.
#[derive(Clone, Default)]
struct SharedStore(Arc<Mutex<InMemoryGraphStore>>);

impl GraphStore for SharedStore {
    fn merge_nodes(&mut self, nodes: &[NodeWrite]) -> StoreResult<()> {
        self.0.lock().unwrap().merge_nodes(nodes)
    }
    fn merge_relationships(&mut self, edges: &[EdgeWrite]) -> StoreResult<()> {
        self.0.lock().unwrap().merge_relationships(edges)
    }
    fn node_exists(&self, descriptor: &NodeDescriptor) -> bool {
        self.0.lock().unwrap().node_exists(descriptor)
    }
    fn delete_project(&mut self, project_root_path: &str) -> StoreResult<()> {
        self.0.lock().unwrap().delete_project(project_root_path)
    }
}

fn settings_for(root: &std::path::Path) -> Settings {
    let mut settings = Settings::default();
    settings.repo_root = root.to_path_buf();
    settings
}

/// §8 S1 — single-file class and call.
#[test]
fn s1_single_file_class_and_call() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.py"),
        "class C:\n    def f(self): return 1\ndef g():\n    c = C()\n    c.f()\n",
    )
    .unwrap();

    let settings = settings_for(dir.path());
    let store = SharedStore::default();
    let handle = store.0.clone();
    let stats = run_ingestion(&settings, store).unwrap();

    assert_eq!(stats.files_seen, 1);
    assert_eq!(stats.parse_errors, 0);

    let graph = handle.lock().unwrap();
    let module = NodeDescriptor::by_qualified_name(NodeKind::Module, "a");
    let class = NodeDescriptor::by_qualified_name(NodeKind::Class, "a.C");
    let method = NodeDescriptor::by_qualified_name(NodeKind::Method, "a.C.f");
    let func = NodeDescriptor::by_qualified_name(NodeKind::Function, "a.g");

    let calls_from_g = graph.outgoing(&func, EdgeKind::Calls);
    assert!(calls_from_g.contains(&method), "expected a.g to CALL a.C.f");
    assert!(calls_from_g.contains(&class), "expected a.g to CALL a.C (constructor)");

    let defines_from_module = graph.outgoing(&module, EdgeKind::Defines);
    assert!(defines_from_module.contains(&class));
    assert!(defines_from_module.contains(&func));

    let defines_from_class = graph.outgoing(&class, EdgeKind::Defines);
    assert!(defines_from_class.contains(&method));
}

/// §8 property 11 / S6 — a deeply nested body must not blow the stack, and
/// repeated calls to the same target collapse to one CALLS edge.
#[test]
fn s6_deeply_nested_body_is_stack_safe_and_deduped() {
    let dir = TempDir::new().unwrap();
    let depth = 5000;
    let mut source = String::from("def x():\n    pass\n\ndef outer():\n");
    for i in 0..depth {
        source.push_str(&"    ".repeat(i + 1));
        source.push_str("if True:\n");
    }
    source.push_str(&"    ".repeat(depth + 1));
    source.push_str("x()\n");
    fs::write(dir.path().join("deep.py"), source).unwrap();

    let settings = settings_for(dir.path());
    let store = SharedStore::default();
    let handle = store.0.clone();
    let stats = run_ingestion(&settings, store).unwrap();

    assert_eq!(stats.parse_errors, 0);
    assert_eq!(stats.files_timed_out, 0);

    let graph = handle.lock().unwrap();
    let outer = NodeDescriptor::by_qualified_name(NodeKind::Function, "deep.outer");
    let x = NodeDescriptor::by_qualified_name(NodeKind::Function, "deep.x");
    let calls = graph.outgoing(&outer, EdgeKind::Calls);
    assert_eq!(calls.iter().filter(|d| **d == x).count(), 1, "repeated calls must dedup to one edge");
}

/// §8 property 4 — determinism across repeated runs.
#[test]
fn determinism_across_repeated_runs() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();
    fs::write(dir.path().join("b.py"), "def g():\n    f()\n").unwrap();

    let settings = settings_for(dir.path());

    let stats1 = run_ingestion(&settings, InMemoryGraphStore::new()).unwrap();
    let stats2 = run_ingestion(&settings, InMemoryGraphStore::new()).unwrap();

    assert_eq!(stats1.nodes_created, stats2.nodes_created);
    assert_eq!(stats1.edges_created, stats2.edges_created);
}

/// §8 property 1/2 — FQN uniqueness and exactly one DEFINES edge per node.
#[test]
fn fqn_uniqueness_and_single_defines_parent() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("m.py"),
        "class A:\n    def f(self): pass\nclass B:\n    def f(self): pass\n",
    )
    .unwrap();

    let settings = settings_for(dir.path());
    let store = SharedStore::default();
    let handle = store.0.clone();
    run_ingestion(&settings, store).unwrap();

    let graph = handle.lock().unwrap();
    let a_f = NodeDescriptor::by_qualified_name(NodeKind::Method, "m.A.f");
    let b_f = NodeDescriptor::by_qualified_name(NodeKind::Method, "m.B.f");
    assert_ne!(a_f, b_f);
    assert!(graph.node_exists(&a_f));
    assert!(graph.node_exists(&b_f));
}

/// §8 property 7 — a multi-name import (`from lib import a, b, c`) yields
/// three distinct import-map entries, each resolving its own call.
#[test]
fn property7_multi_name_import_resolves_three_calls() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("lib.py"), "def a(): pass\ndef b(): pass\ndef c(): pass\n").unwrap();
    fs::write(dir.path().join("main.py"), "from lib import a, b, c\na()\nb()\nc()\n").unwrap();

    let settings = settings_for(dir.path());
    let store = SharedStore::default();
    let handle = store.0.clone();
    let stats = run_ingestion(&settings, store).unwrap();
    assert_eq!(stats.parse_errors, 0);

    let graph = handle.lock().unwrap();
    let main_module = NodeDescriptor::by_qualified_name(NodeKind::Module, "main");
    let calls = graph.outgoing(&main_module, EdgeKind::Calls);
    for target in ["lib.a", "lib.b", "lib.c"] {
        let descriptor = NodeDescriptor::by_qualified_name(NodeKind::Function, target);
        assert!(calls.contains(&descriptor), "expected a CALLS edge to {target}");
    }
}

/// §8 S5 — a CommonJS destructured `require` (`const {a, b, c} = require('lib')`)
/// resolves each destructured name to its own call, the same as a
/// statement-based multi-name import.
#[test]
fn s5_commonjs_destructured_require_resolves_three_calls() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("lib.js"),
        "function a() {}\nfunction b() {}\nfunction c() {}\nmodule.exports = { a, b, c };\n",
    )
    .unwrap();
    fs::write(dir.path().join("main.js"), "const { a, b, c } = require('./lib');\na();\nb();\nc();\n").unwrap();

    let settings = settings_for(dir.path());
    let store = SharedStore::default();
    let handle = store.0.clone();
    let stats = run_ingestion(&settings, store).unwrap();
    assert_eq!(stats.parse_errors, 0);

    let graph = handle.lock().unwrap();
    let main_module = NodeDescriptor::by_qualified_name(NodeKind::Module, "main");
    let calls = graph.outgoing(&main_module, EdgeKind::Calls);
    for target in ["lib.a", "lib.b", "lib.c"] {
        let descriptor = NodeDescriptor::by_qualified_name(NodeKind::Function, target);
        assert!(calls.contains(&descriptor), "expected a CALLS edge to {target}");
    }
}
