//! The orchestrator (spec §5): walks the repo, parses files across a rayon
//! worker pool with a bounded crossbeam channel providing backpressure,
//! merges pass 1 (definitions + imports) on a single writer thread, then
//! resolves pass 2 (type inference + call resolution) and the final
//! INHERITS link phase, flushing everything through a `BatchIngestor`.

use crate::config::Settings;
use crate::error::{IngestError, IngestResult, LocalErrorKind, RunStats};
use crate::graph::{BatchIngestor, EdgeWrite, EmittedEntity, GraphStore, NodeBuilder, NodeDescriptor, NodeWrite, Props};
use crate::indexing::definitions::{process_definitions, PendingSupertype};
use crate::indexing::imports::{process_imports, ImportMapping};
use crate::indexing::inference::{build_local_var_type_map, infer_return_type, LocalTypeMap};
use crate::indexing::link::{resolve_supertype, ClassNameIndex, LinkOutcome};
use crate::indexing::resolver::{classify_call, dedupe_calls, resolve_call, ResolvedCall};
use crate::parsing::{
    families, parse_file_with_timeout, FileWalker, GrammarRegistry, LanguageBehavior, ParsedFile, SkipReason,
};
use crate::registry::FunctionRegistry;
use crate::types::{EdgeKind, FileId, NodeKind, FQN_SEPARATOR};
use crate::vector::{self, EmbeddingClient, Snippet, VectorIndex};
use crossbeam_channel::bounded;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tree_sitter::Node;

/// Everything the single-writer merge step needs about one file beyond its
/// parsed tree, computed once up front (§4.1/§4.4).
struct FileContext {
    parsed: ParsedFile,
    file_id: FileId,
    module_fqn: String,
    package_fqn: Option<String>,
}

enum WorkerMessage {
    Parsed(FileContext),
    ParseFailed,
    TimedOut,
}

/// Runs a full ingestion over `settings.repo_root`, writing into `store`.
/// Returns the accumulated `RunStats` on success; an `IngestError` aborts
/// the whole run (§7).
pub fn run_ingestion(settings: &Settings, store: impl GraphStore) -> IngestResult<RunStats> {
    run_ingestion_with_embeddings(settings, store, None)
}

/// Same as `run_ingestion`, additionally running the optional embedding
/// pipeline (§4.9) over every Function/Method node when `embedding` is
/// `Some` and `settings.embeddings.enabled`. The embedding pipeline is
/// strictly additive: its failures are logged, never surfaced here.
pub fn run_ingestion_with_embeddings(
    settings: &Settings,
    store: impl GraphStore,
    embedding: Option<(&dyn EmbeddingClient, &mut dyn VectorIndex)>,
) -> IngestResult<RunStats> {
    let mut stats = RunStats::default();

    let root = settings
        .repo_root
        .canonicalize()
        .map_err(|source| IngestError::RootUnreadable {
            path: settings.repo_root.clone(),
            source,
        })?;

    let walker = FileWalker::new(settings);
    let (classified, skipped) = walker.walk(&root);
    stats.files_seen = (classified.len() + skipped.len()) as u64;
    for skip in &skipped {
        match skip.reason {
            SkipReason::TooLarge => stats.files_skipped_too_large += 1,
            SkipReason::UnsupportedExtension | SkipReason::LanguageDisabled => {
                stats.files_skipped_unsupported += 1
            }
        }
    }

    // FileIds are assigned from the already-lexicographically-sorted walk
    // order, not a hash, so two runs over an unchanged tree produce
    // identical ids (§8 property 4).
    let file_ids: HashMap<PathBuf, FileId> = classified
        .iter()
        .enumerate()
        .map(|(i, f)| (f.path.clone(), FileId::new(i as u32 + 1).expect("index + 1 is never zero")))
        .collect();

    let grammar_registry = GrammarRegistry::new();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.indexing.worker_count.max(1))
        .build()
        .map_err(|e| IngestError::Config {
            reason: format!("failed to start worker pool: {e}"),
        })?;

    let project_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_string();
    let root_path_str = root.to_string_lossy().to_string();

    let mut nodes = vec![NodeBuilder::project(&project_name, &root_path_str)];
    let mut edges = Vec::new();
    let mut registry = FunctionRegistry::new();
    let mut known_packages: HashSet<String> = HashSet::new();

    // --- Pass 1, parse half: parse in parallel, merge on one writer thread ---
    let (tx, rx) = bounded::<WorkerMessage>(settings.indexing.batch_size.max(1));
    let timeout_micros = settings.indexing.parse_timeout_secs.saturating_mul(1_000_000);

    let mut contexts: Vec<FileContext> = std::thread::scope(|scope| {
        let consumer = scope.spawn(|| {
            let mut collected = Vec::new();
            let mut local_stats = RunStats::default();
            for message in rx.iter() {
                match message {
                    WorkerMessage::Parsed(ctx) => collected.push(ctx),
                    WorkerMessage::ParseFailed => local_stats.record(LocalErrorKind::ParseError),
                    WorkerMessage::TimedOut => local_stats.files_timed_out += 1,
                }
            }
            (collected, local_stats)
        });

        pool.install(|| {
            use rayon::prelude::*;
            classified.par_iter().for_each_with(tx.clone(), |tx, file| {
                let source = match std::fs::read_to_string(&file.path) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tx.send(WorkerMessage::ParseFailed);
                        return;
                    }
                };
                let parsed = parse_file_with_timeout(
                    &grammar_registry,
                    file.path.clone(),
                    file.language,
                    source,
                    timeout_micros,
                );
                let Some(parsed) = parsed else {
                    let _ = tx.send(WorkerMessage::TimedOut);
                    return;
                };
                let (module_fqn, package_fqn) = compute_fqns(&root, &file.path);
                let file_id = file_ids[&file.path];
                let _ = tx.send(WorkerMessage::Parsed(FileContext {
                    parsed,
                    file_id,
                    module_fqn,
                    package_fqn,
                }));
            });
        });
        drop(tx);

        let (collected, local_stats) = consumer.join().expect("merge thread panicked");
        stats.files_timed_out += local_stats.files_timed_out;
        stats.parse_errors += local_stats.parse_errors;
        collected
    });

    // Deterministic merge order regardless of parallel completion order.
    contexts.sort_by(|a, b| a.parsed.path.cmp(&b.parsed.path));

    let mut pending_supertypes: Vec<PendingSupertype> = Vec::new();
    let mut class_index = ClassNameIndex::default();
    let mut module_index: HashSet<String> = HashSet::new();
    let mut callable_entities: Vec<EmittedEntity> = Vec::new();
    // Every fqn this run knows a label for, so a CALLS edge can address its
    // endpoints by their real label instead of guessing Function (a call
    // target may be a Class constructor or a Module for a top-level call).
    let mut entity_kind_by_fqn: HashMap<String, NodeKind> = HashMap::new();

    for ctx in &contexts {
        module_index.insert(ctx.module_fqn.clone());
        entity_kind_by_fqn.insert(ctx.module_fqn.clone(), NodeKind::Module);
    }

    for ctx in &contexts {
        emit_package_chain(&ctx.package_fqn, &root_path_str, &mut nodes, &mut edges, &mut known_packages);

        let behavior = families::behavior_for(ctx.parsed.language);
        let output = process_definitions(
            &ctx.parsed,
            ctx.file_id,
            &ctx.module_fqn,
            ctx.package_fqn.as_deref(),
            behavior.as_ref(),
            &mut registry,
        );
        if ctx.package_fqn.is_none() {
            edges.push(EdgeWrite {
                src: NodeDescriptor::project(&root_path_str),
                kind: EdgeKind::ContainsModule,
                dst: NodeDescriptor::by_qualified_name(NodeKind::Module, &ctx.module_fqn),
                props: Props::new(),
            });
        }
        nodes.extend(output.nodes);
        edges.extend(output.edges);
        pending_supertypes.extend(output.pending_supertypes);
        for entity in &output.entities {
            entity_kind_by_fqn.insert(entity.fqn.clone(), entity.kind);
            if entity.kind == NodeKind::Class {
                class_index.insert(&entity.fqn);
            }
            if matches!(entity.kind, NodeKind::Function | NodeKind::Method) {
                callable_entities.push(entity.clone());
            }
        }
    }

    // --- Pass 1, import half (needs the completed module index) ---
    let mut import_mappings: HashMap<PathBuf, ImportMapping> = HashMap::new();
    for ctx in &contexts {
        let behavior = families::behavior_for(ctx.parsed.language);
        let resolver = |raw: &str| -> Option<String> { resolve_import_path(raw, &ctx.module_fqn, &module_index) };
        let output = process_imports(&ctx.parsed, &ctx.module_fqn, behavior.as_ref(), &resolver);
        nodes.extend(output.nodes);
        edges.extend(output.edges);
        import_mappings.insert(ctx.parsed.path.clone(), output.mapping);
    }

    let module_to_imports: HashMap<&str, &ImportMapping> = contexts
        .iter()
        .map(|ctx| (ctx.module_fqn.as_str(), &import_mappings[&ctx.parsed.path]))
        .collect();

    // --- Link phase: resolve INHERITS now that every Class node exists ---
    for pending in &pending_supertypes {
        // Approximation: the lexical parent of a top-level class is its
        // module, so this recovers the owning module for the common case.
        // A class nested inside another class or a function keeps the
        // parent's *simple* scope chain instead of the true module FQN,
        // which only matters for resolving an unqualified supertype name
        // that collides with another module's class of the same name.
        let module_of_class = class_index_owner_module(&pending.class_fqn);
        let module_imports = module_to_imports.get(module_of_class.as_str()).copied();
        match resolve_supertype(pending, &module_of_class, module_imports, &class_index) {
            LinkOutcome::Resolved(edge) => edges.push(edge),
            LinkOutcome::Miss => stats.record(LocalErrorKind::ResolutionMiss),
            LinkOutcome::Ambiguous => stats.record(LocalErrorKind::Ambiguity),
        }
    }

    // --- Pass 2: type inference + call resolution, read-only over the registry ---
    // One constructor Method per Class, keyed by the class's own FQN, so a
    // `new X(...)`/`X(...)` call resolves to the constructor rather than the
    // Class node whenever one was tagged during pass 1 (§4.7 item 4).
    let mut constructors: HashMap<String, String> = HashMap::new();
    for entity in &callable_entities {
        if entity.is_constructor {
            if let Some(class_fqn) = &entity.lexical_parent_fqn {
                constructors.entry(class_fqn.clone()).or_insert_with(|| entity.fqn.clone());
            }
        }
    }

    let return_types = compute_return_types(&contexts, &registry, &import_mappings);
    let mut resolved_calls: Vec<ResolvedCall> = Vec::new();
    for ctx in &contexts {
        let behavior = families::behavior_for(ctx.parsed.language);
        let imports = &import_mappings[&ctx.parsed.path];
        walk_calls_for_file(
            ctx,
            behavior.as_ref(),
            &registry,
            imports,
            &return_types,
            &constructors,
            settings.indexing.call_chain_depth,
            &mut resolved_calls,
            &mut stats,
        );
    }
    for call in dedupe_calls(resolved_calls) {
        let src_kind = entity_kind_by_fqn.get(&call.caller_fqn).copied().unwrap_or(NodeKind::Function);
        let dst_kind = entity_kind_by_fqn.get(&call.target_fqn).copied().unwrap_or(NodeKind::Function);
        edges.push(EdgeWrite {
            src: NodeDescriptor::by_qualified_name(src_kind, &call.caller_fqn),
            kind: EdgeKind::Calls,
            dst: NodeDescriptor::by_qualified_name(dst_kind, &call.target_fqn),
            props: Props::new(),
        });
    }

    stats.nodes_created = nodes.len() as u64;
    stats.edges_created = edges.len() as u64;

    // --- Flush everything through the batched ingestor (§4.8) ---
    let mut ingestor = BatchIngestor::new(store, settings.indexing.batch_size);
    for node in nodes {
        ingestor.ensure_node_batch(node)?;
    }
    for edge in edges {
        ingestor.ensure_relationship_batch(edge)?;
    }
    ingestor.close()?;

    // --- Optional embedding pipeline (§4.9): strictly additive ---
    if settings.embeddings.enabled {
        if let Some((client, index)) = embedding {
            let file_sources: HashMap<FileId, &str> =
                contexts.iter().map(|ctx| (ctx.file_id, ctx.parsed.source.as_str())).collect();

            // Sorted by fqn, not discovery order, so the node_id ordinal
            // assigned below is stable across repeated runs (§8 property 4).
            callable_entities.sort_by(|a, b| a.fqn.cmp(&b.fqn));
            let snippets: Vec<Snippet> = callable_entities
                .iter()
                .enumerate()
                .filter_map(|(i, entity)| {
                    let source = file_sources.get(&entity.file_id)?;
                    let text = vector::extract_snippet(source, entity.range.start_line, entity.range.end_line);
                    Some(Snippet {
                        node_id: i as u32,
                        qualified_name: entity.fqn.clone(),
                        text,
                    })
                })
                .collect();

            let embedding_stats = vector::run_embedding_pipeline(&snippets, client, index, settings.embeddings.batch_size);
            tracing::info!(
                submitted = embedding_stats.snippets_submitted,
                stored = embedding_stats.vectors_stored,
                failed_batches = embedding_stats.batches_failed,
                "embedding pipeline finished"
            );
        }
    }

    Ok(stats)
}

fn class_index_owner_module(class_fqn: &str) -> String {
    class_fqn
        .rsplit_once(FQN_SEPARATOR)
        .map(|(module, _)| module.to_string())
        .unwrap_or_default()
}

/// One entry in the iterative scope walk used by `compute_return_types`:
/// the node to visit, the FQN of its lexical scope, and the enclosing
/// class FQN if any (for `this`/`self` receivers).
struct ScopeFrame<'a> {
    node: Node<'a>,
    scope_fqn: String,
    class_fqn: Option<String>,
}

fn compute_return_types(
    contexts: &[FileContext],
    registry: &FunctionRegistry,
    import_mappings: &HashMap<PathBuf, ImportMapping>,
) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for ctx in contexts {
        let behavior = families::behavior_for(ctx.parsed.language);
        let imports = &import_mappings[&ctx.parsed.path];
        let mut stack = vec![ScopeFrame {
            node: ctx.parsed.tree.root_node(),
            scope_fqn: ctx.module_fqn.clone(),
            class_fqn: None,
        }];
        while let Some(frame) = stack.pop() {
            let node = frame.node;
            if behavior.class_node_kinds().contains(&node.kind()) {
                if let Some(name) = behavior.declared_name(node, &ctx.parsed.source) {
                    let fqn = format!("{}{FQN_SEPARATOR}{name}", frame.scope_fqn);
                    push_scope_children(&mut stack, node, fqn.clone(), Some(fqn));
                    continue;
                }
            }
            if behavior.function_node_kinds().contains(&node.kind())
                || behavior.method_node_kinds().contains(&node.kind())
            {
                if let Some(name) = behavior.declared_name(node, &ctx.parsed.source) {
                    let fqn = format!("{}{FQN_SEPARATOR}{name}", frame.scope_fqn);
                    if let Some(body) = node.child_by_field_name("body") {
                        if let Some(ty) = infer_return_type(
                            body,
                            &ctx.parsed.source,
                            &ctx.module_fqn,
                            frame.class_fqn.as_deref(),
                            registry,
                            imports,
                        ) {
                            out.insert(fqn.clone(), ty);
                        }
                    }
                    push_scope_children(&mut stack, node, fqn, frame.class_fqn.clone());
                    continue;
                }
            }
            push_scope_children(&mut stack, node, frame.scope_fqn, frame.class_fqn);
        }
    }
    out
}

fn push_scope_children<'a>(
    stack: &mut Vec<ScopeFrame<'a>>,
    node: Node<'a>,
    scope_fqn: String,
    class_fqn: Option<String>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        stack.push(ScopeFrame {
            node: child,
            scope_fqn: scope_fqn.clone(),
            class_fqn: class_fqn.clone(),
        });
    }
}

/// One entry in the call-resolution walk: additionally tracks the FQN and
/// body node of the innermost enclosing callable, so a call found deep in
/// nested blocks still resolves against the right caller and local scope.
struct CallFrame<'a> {
    node: Node<'a>,
    scope_fqn: String,
    class_fqn: Option<String>,
    caller: Option<(String, Node<'a>)>,
}

#[allow(clippy::too_many_arguments)]
fn walk_calls_for_file(
    ctx: &FileContext,
    behavior: &dyn LanguageBehavior,
    registry: &FunctionRegistry,
    imports: &ImportMapping,
    return_types: &HashMap<String, String>,
    constructors: &HashMap<String, String>,
    call_chain_depth: usize,
    out: &mut Vec<ResolvedCall>,
    stats: &mut RunStats,
) {
    let mut locals_cache: HashMap<String, LocalTypeMap> = HashMap::new();
    // Top-level statements are attributed to the Module node itself (§8 S2:
    // "the CALLS edge is emitted from the synthetic module-init node" — here
    // the already-existing Module node fills that role).
    let root = ctx.parsed.tree.root_node();
    let mut stack = vec![CallFrame {
        node: root,
        scope_fqn: ctx.module_fqn.clone(),
        class_fqn: None,
        caller: Some((ctx.module_fqn.clone(), root)),
    }];

    while let Some(frame) = stack.pop() {
        let node = frame.node;

        if behavior.class_node_kinds().contains(&node.kind()) {
            if let Some(name) = behavior.declared_name(node, &ctx.parsed.source) {
                let fqn = format!("{}{FQN_SEPARATOR}{name}", frame.scope_fqn);
                push_call_children(&mut stack, node, fqn.clone(), Some(fqn), frame.caller);
                continue;
            }
        }

        if behavior.function_node_kinds().contains(&node.kind()) || behavior.method_node_kinds().contains(&node.kind())
        {
            if let Some(name) = behavior.declared_name(node, &ctx.parsed.source) {
                let fqn = format!("{}{FQN_SEPARATOR}{name}", frame.scope_fqn);
                let body = node.child_by_field_name("body").unwrap_or(node);
                push_call_children(
                    &mut stack,
                    node,
                    fqn.clone(),
                    frame.class_fqn.clone(),
                    Some((fqn, body)),
                );
                continue;
            }
        }

        if behavior.call_node_kinds().contains(&node.kind()) {
            if let Some((caller_fqn, body)) = &frame.caller {
                if let Some(shape) = classify_call(node, &ctx.parsed.source, call_chain_depth) {
                    let locals = locals_cache.entry(caller_fqn.clone()).or_insert_with(|| {
                        build_local_var_type_map(
                            *body,
                            &ctx.parsed.source,
                            &ctx.module_fqn,
                            frame.class_fqn.as_deref(),
                            registry,
                            imports,
                            return_types,
                        )
                    });
                    match resolve_call(
                        &shape,
                        &ctx.module_fqn,
                        frame.class_fqn.as_deref(),
                        locals,
                        imports,
                        registry,
                        constructors,
                    ) {
                        Some(target) => out.push(ResolvedCall {
                            caller_fqn: caller_fqn.clone(),
                            target_fqn: target,
                        }),
                        None => stats.record(LocalErrorKind::ResolutionMiss),
                    }
                }
            }
        }

        push_call_children(&mut stack, node, frame.scope_fqn, frame.class_fqn, frame.caller);
    }
}

#[allow(clippy::too_many_arguments)]
fn push_call_children<'a>(
    stack: &mut Vec<CallFrame<'a>>,
    node: Node<'a>,
    scope_fqn: String,
    class_fqn: Option<String>,
    caller: Option<(String, Node<'a>)>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        stack.push(CallFrame {
            node: child,
            scope_fqn: scope_fqn.clone(),
            class_fqn: class_fqn.clone(),
            caller: caller.clone(),
        });
    }
}

/// `path` relative to `root`, dot-joined, extension stripped (§4.4 module
/// FQN). Returns `(module_fqn, package_fqn)`; `package_fqn` is `None` for a
/// file directly under the repo root.
fn compute_fqns(root: &Path, path: &Path) -> (String, Option<String>) {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if let Some(last) = segments.last_mut() {
        if let Some(stripped) = last.rsplit_once('.') {
            *last = stripped.0.to_string();
        }
    }
    let separator = FQN_SEPARATOR.to_string();
    let module_fqn = segments.join(&separator);
    let package_fqn = if segments.len() > 1 {
        Some(segments[..segments.len() - 1].join(&separator))
    } else {
        None
    };
    (module_fqn, package_fqn)
}

fn emit_package_chain(
    package_fqn: &Option<String>,
    root_path: &str,
    nodes: &mut Vec<NodeWrite>,
    edges: &mut Vec<EdgeWrite>,
    known: &mut HashSet<String>,
) {
    let Some(fqn) = package_fqn else { return };
    let segments: Vec<&str> = fqn.split(FQN_SEPARATOR).collect();
    let mut prefix = String::new();
    for (i, seg) in segments.iter().enumerate() {
        let parent = prefix.clone();
        if !prefix.is_empty() {
            prefix.push(FQN_SEPARATOR);
        }
        prefix.push_str(seg);

        if known.insert(prefix.clone()) {
            nodes.push(NodeBuilder::package(&prefix, seg));
            let src = if i == 0 {
                NodeDescriptor::project(root_path)
            } else {
                NodeDescriptor::by_qualified_name(NodeKind::Package, &parent)
            };
            edges.push(EdgeWrite {
                src,
                kind: EdgeKind::ContainsPackage,
                dst: NodeDescriptor::by_qualified_name(NodeKind::Package, &prefix),
                props: Props::new(),
            });
        }
    }
}

/// Resolves a raw import path written in source (`./sibling`, `pkg.mod`,
/// a bare package name) to a project module FQN, or `None` when it points
/// outside the indexed tree (§4.5).
fn resolve_import_path(raw: &str, current_module_fqn: &str, module_index: &HashSet<String>) -> Option<String> {
    let separator = FQN_SEPARATOR.to_string();
    let normalized = raw.trim_start_matches("./").replace(['/', '\\'], &separator);
    if module_index.contains(&normalized) {
        return Some(normalized);
    }
    if raw.starts_with('.') {
        if let Some((package, _)) = current_module_fqn.rsplit_once(FQN_SEPARATOR) {
            let candidate = format!("{package}{FQN_SEPARATOR}{normalized}");
            if module_index.contains(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}
