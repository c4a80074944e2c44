//! Pass 1, import half (spec §4.5): builds the per-module import mapping
//! (`local_alias -> resolved target`) that pass 2's call resolver consults
//! to turn a bare identifier into a candidate FQN.

use crate::graph::{EdgeWrite, NodeBuilder, NodeDescriptor, NodeWrite, Props};
use crate::parsing::families::{gdscript, javascript, lua};
use crate::parsing::{ImportForm, LanguageBehavior, ParsedFile};
use crate::types::{EdgeKind, Language, NodeKind};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// Resolved to a single named entity (a module, class, or function FQN
    /// known to the function registry or certain to exist after pass 1).
    Named(String),
    /// A wildcard/namespace import; candidates are resolved lazily in pass
    /// 2 via `FunctionRegistry::prefix_scan(source_module_fqn)`.
    Wildcard { source_module_fqn: String },
}

#[derive(Debug, Default, Clone)]
pub struct ImportMapping {
    pub entries: HashMap<String, ImportTarget>,
}

impl ImportMapping {
    pub fn resolve(&self, local_alias: &str) -> Option<&ImportTarget> {
        self.entries.get(local_alias)
    }
}

/// Maps a raw import path (`./sibling`, `pkg.mod`, `"github.com/x/y"`, ...)
/// to a project module FQN, or `None` when it refers outside the indexed
/// tree (§4.5 "relative path resolution to project module or external
/// synthetic Module node").
pub type ModuleResolver<'a> = &'a dyn Fn(&str) -> Option<String>;

pub struct ImportsOutput {
    pub mapping: ImportMapping,
    pub nodes: Vec<NodeWrite>,
    pub edges: Vec<EdgeWrite>,
}

pub fn process_imports(
    file: &ParsedFile,
    module_fqn: &str,
    behavior: &dyn LanguageBehavior,
    resolve_module: ModuleResolver<'_>,
) -> ImportsOutput {
    let mut forms = Vec::new();

    let import_kinds = behavior.import_node_kinds();
    if !import_kinds.is_empty() {
        let mut stack = vec![file.tree.root_node()];
        while let Some(node) = stack.pop() {
            if import_kinds.contains(&node.kind()) {
                forms.extend(behavior.parse_import(node, &file.source));
                continue; // import statements don't nest further imports
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
    }

    // Lua/GDScript encode their "import" as an ordinary call expression
    // (`require(...)`, `preload(...)`) rather than a dedicated statement
    // kind, so they're picked up by scanning call nodes instead (§4.5).
    match file.language {
        Language::Lua => collect_call_based_imports(file, behavior, &mut forms, lua::require_target),
        Language::GdScript => {
            collect_call_based_imports(file, behavior, &mut forms, gdscript::preload_target)
        }
        Language::JavaScript | Language::TypeScript => {
            collect_call_based_imports(file, behavior, &mut forms, javascript::commonjs_require_targets)
        }
        _ => {}
    }

    let mut mapping = ImportMapping::default();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut synthesized = std::collections::HashSet::new();

    for form in forms {
        let target_module_fqn = resolve_module(&form.source_module);
        let is_external = target_module_fqn.is_none();
        let module_fqn_resolved = target_module_fqn.unwrap_or_else(|| form.source_module.clone());

        if is_external && synthesized.insert(module_fqn_resolved.clone()) {
            nodes.push(NodeBuilder::external_module(&module_fqn_resolved));
        }

        edges.push(EdgeWrite {
            src: NodeDescriptor::by_qualified_name(NodeKind::Module, module_fqn),
            kind: EdgeKind::Imports,
            dst: NodeDescriptor::by_qualified_name(NodeKind::Module, &module_fqn_resolved),
            props: Props::new(),
        });

        if form.is_wildcard {
            mapping.entries.insert(
                form.local_alias.clone(),
                ImportTarget::Wildcard {
                    source_module_fqn: module_fqn_resolved.clone(),
                },
            );
            continue;
        }

        // `imported_name` carries the name as written at the *source*
        // side; the map key is always the *local* alias, which matters for
        // the re-export direction: `export {name as alias} from './other'`
        // maps `alias -> other.name`, never `name -> other.alias` (§4.5).
        let target_name = form.imported_name.as_deref().unwrap_or(&form.local_alias);
        let target_fqn = format!("{module_fqn_resolved}.{target_name}");
        mapping
            .entries
            .insert(form.local_alias.clone(), ImportTarget::Named(target_fqn));
    }

    ImportsOutput {
        mapping,
        nodes,
        edges,
    }
}

fn collect_call_based_imports(
    file: &ParsedFile,
    behavior: &dyn LanguageBehavior,
    forms: &mut Vec<ImportForm>,
    extract: impl Fn(tree_sitter::Node<'_>, &str) -> Vec<ImportForm>,
) {
    let call_kinds = behavior.call_node_kinds();
    let mut stack = vec![file.tree.root_node()];
    while let Some(node) = stack.pop() {
        if call_kinds.contains(&node.kind()) {
            forms.extend(extract(node, &file.source));
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{families, parse_file, GrammarRegistry};

    fn parsed(source: &str) -> ParsedFile {
        let registry = GrammarRegistry::new();
        parse_file(&registry, "test.py".into(), Language::Python, source.to_string()).unwrap()
    }

    fn parsed_js(source: &str) -> ParsedFile {
        let registry = GrammarRegistry::new();
        parse_file(&registry, "test.js".into(), Language::JavaScript, source.to_string()).unwrap()
    }

    #[test]
    fn named_import_resolves_to_project_module() {
        let file = parsed("from pkg.util import helper\n");
        let behavior = families::behavior_for(Language::Python);
        let resolver = |raw: &str| -> Option<String> {
            if raw == "pkg.util" {
                Some("pkg.util".to_string())
            } else {
                None
            }
        };
        let output = process_imports(&file, "pkg.main", behavior.as_ref(), &resolver);
        match output.mapping.resolve("helper") {
            Some(ImportTarget::Named(fqn)) => assert_eq!(fqn, "pkg.util.helper"),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn unresolvable_import_becomes_external_module() {
        let file = parsed("import requests\n");
        let behavior = families::behavior_for(Language::Python);
        let resolver = |_: &str| -> Option<String> { None };
        let output = process_imports(&file, "pkg.main", behavior.as_ref(), &resolver);
        assert_eq!(output.nodes.len(), 1);
        assert!(output.mapping.resolve("requests").is_some());
    }

    #[test]
    fn commonjs_destructuring_import_resolves_each_name() {
        let file = parsed_js("const { a, b, c } = require('./lib');\n");
        let behavior = families::behavior_for(Language::JavaScript);
        let resolver = |raw: &str| -> Option<String> {
            if raw == "./lib" {
                Some("pkg.lib".to_string())
            } else {
                None
            }
        };
        let output = process_imports(&file, "pkg.main", behavior.as_ref(), &resolver);
        for name in ["a", "b", "c"] {
            match output.mapping.resolve(name) {
                Some(ImportTarget::Named(fqn)) => assert_eq!(fqn, &format!("pkg.lib.{name}")),
                other => panic!("unexpected mapping for {name}: {other:?}"),
            }
        }
    }

    #[test]
    fn wildcard_import_is_flagged_for_lazy_resolution() {
        let file = parsed("from pkg.util import *\n");
        let behavior = families::behavior_for(Language::Python);
        let resolver = |raw: &str| -> Option<String> {
            if raw == "pkg.util" {
                Some("pkg.util".to_string())
            } else {
                None
            }
        };
        let output = process_imports(&file, "pkg.main", behavior.as_ref(), &resolver);
        match output.mapping.resolve("util") {
            Some(ImportTarget::Wildcard { source_module_fqn }) => {
                assert_eq!(source_module_fqn, "pkg.util")
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
