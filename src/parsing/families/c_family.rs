//! Table-driven behavior for the brace-language family: Go, Java, Kotlin,
//! PHP, C#, C++, C, Swift (spec §4.4, §9 design note).
//!
//! These eight grammars differ in node-kind names but share the same
//! shape — a class-like body, a function/method body, an import-like
//! statement, a call expression — so one implementation parameterized by a
//! per-language table covers all of them instead of eight bespoke files.

use crate::parsing::behavior::{node_text, ImportForm, LanguageBehavior};
use crate::types::EdgeKind;
use tree_sitter::Node;

struct Table {
    class_kinds: &'static [&'static str],
    function_kinds: &'static [&'static str],
    method_kinds: &'static [&'static str],
    import_kinds: &'static [&'static str],
    call_kinds: &'static [&'static str],
    /// Keyword each import statement starts with, stripped before the
    /// module path is extracted (`"import"`, `"use"`, `"using"`, ...).
    import_keyword: &'static str,
    constructor_name: Option<&'static str>,
}

pub struct CFamilyBehavior {
    table: &'static Table,
}

macro_rules! ctor {
    ($name:ident, $table:expr) => {
        pub fn $name() -> Self {
            Self { table: &$table }
        }
    };
}

static GO: Table = Table {
    class_kinds: &["type_declaration"],
    function_kinds: &["function_declaration"],
    method_kinds: &["method_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &["call_expression"],
    import_keyword: "import",
    constructor_name: None,
};

static JAVA: Table = Table {
    class_kinds: &["class_declaration", "interface_declaration", "enum_declaration"],
    function_kinds: &[],
    method_kinds: &["method_declaration", "constructor_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &["method_invocation", "object_creation_expression"],
    import_keyword: "import",
    constructor_name: None,
};

static KOTLIN: Table = Table {
    class_kinds: &["class_declaration", "object_declaration"],
    function_kinds: &["function_declaration"],
    method_kinds: &["function_declaration"],
    import_kinds: &["import_header"],
    call_kinds: &["call_expression"],
    import_keyword: "import",
    constructor_name: None,
};

static PHP: Table = Table {
    class_kinds: &["class_declaration", "interface_declaration", "trait_declaration"],
    function_kinds: &["function_definition"],
    method_kinds: &["method_declaration"],
    import_kinds: &["namespace_use_declaration"],
    call_kinds: &["function_call_expression", "object_creation_expression"],
    import_keyword: "use",
    constructor_name: Some("__construct"),
};

static CSHARP: Table = Table {
    class_kinds: &["class_declaration", "interface_declaration", "struct_declaration"],
    function_kinds: &[],
    method_kinds: &["method_declaration", "constructor_declaration"],
    import_kinds: &["using_directive"],
    call_kinds: &["invocation_expression", "object_creation_expression"],
    import_keyword: "using",
    constructor_name: None,
};

static CPP: Table = Table {
    class_kinds: &["class_specifier", "struct_specifier"],
    function_kinds: &["function_definition"],
    method_kinds: &["function_definition"],
    import_kinds: &["preproc_include"],
    call_kinds: &["call_expression"],
    import_keyword: "#include",
    constructor_name: None,
};

static C: Table = Table {
    class_kinds: &["struct_specifier"],
    function_kinds: &["function_definition"],
    method_kinds: &[],
    import_kinds: &["preproc_include"],
    call_kinds: &["call_expression"],
    import_keyword: "#include",
    constructor_name: None,
};

static SWIFT: Table = Table {
    class_kinds: &["class_declaration", "protocol_declaration"],
    function_kinds: &["function_declaration"],
    method_kinds: &["function_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &["call_expression"],
    import_keyword: "import",
    constructor_name: Some("init"),
};

impl CFamilyBehavior {
    ctor!(go, GO);
    ctor!(java, JAVA);
    ctor!(kotlin, KOTLIN);
    ctor!(php, PHP);
    ctor!(csharp, CSHARP);
    ctor!(cpp, CPP);
    ctor!(c, C);
    ctor!(swift, SWIFT);
}

impl LanguageBehavior for CFamilyBehavior {
    fn class_node_kinds(&self) -> &'static [&'static str] {
        self.table.class_kinds
    }

    fn function_node_kinds(&self) -> &'static [&'static str] {
        self.table.function_kinds
    }

    fn method_node_kinds(&self) -> &'static [&'static str] {
        self.table.method_kinds
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        self.table.import_kinds
    }

    fn call_node_kinds(&self) -> &'static [&'static str] {
        self.table.call_kinds
    }

    fn declared_name<'a>(&self, node: Node<'a>, source: &'a str) -> Option<&'a str> {
        if let Some(field) = node.child_by_field_name("name") {
            return node_text(field, source);
        }
        // Go's `type_declaration` nests the name under a `type_spec` child.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_spec" {
                if let Some(name) = child.child_by_field_name("name") {
                    return node_text(name, source);
                }
            }
        }
        None
    }

    fn supertype_names<'a>(&self, class_node: Node<'a>, source: &'a str) -> Vec<(EdgeKind, &'a str)> {
        let mut names = Vec::new();
        // `superclass`/`base_class_clause` name the extended base type;
        // `interfaces` names the implemented interface list (Java/C#'s
        // `implements`/interface-list clause) — these are kept as distinct
        // edge kinds rather than merged, since the table already knows
        // which field is which.
        let extends_fields = ["superclass", "base_class_clause", "class_heritage"];
        let implements_fields = ["interfaces"];
        for field in extends_fields {
            if let Some(n) = class_node.child_by_field_name(field) {
                collect_identifiers(n, source, EdgeKind::Inherits, &mut names);
            }
        }
        for field in implements_fields {
            if let Some(n) = class_node.child_by_field_name(field) {
                collect_identifiers(n, source, EdgeKind::Implements, &mut names);
            }
        }
        names
    }

    fn is_constructor(&self, method_name: &str, enclosing_class_name: Option<&str>) -> bool {
        if let Some(ctor) = self.table.constructor_name {
            return method_name == ctor;
        }
        // Java/C#/C++ style: method named identically to its class.
        enclosing_class_name == Some(method_name)
    }

    fn parse_import(&self, node: Node<'_>, source: &str) -> Vec<ImportForm> {
        let Some(text) = node_text(node, source) else {
            return Vec::new();
        };
        let body = text
            .trim()
            .trim_start_matches(self.table.import_keyword)
            .trim()
            .trim_end_matches(';')
            .trim_matches(|c| c == '"' || c == '<' || c == '>' || c == '\'')
            .trim();
        if body.is_empty() {
            return Vec::new();
        }
        let module = body.to_string();
        let local = module
            .rsplit(|c| c == '.' || c == '/' || c == '\\')
            .next()
            .unwrap_or(&module)
            .to_string();
        vec![ImportForm {
            source_module: module,
            imported_name: None,
            local_alias: local,
            is_wildcard: false,
        }]
    }
}

fn collect_identifiers<'a>(node: Node<'a>, source: &'a str, kind: EdgeKind, out: &mut Vec<(EdgeKind, &'a str)>) {
    if matches!(node.kind(), "identifier" | "type_identifier") {
        if let Some(text) = node_text(node, source) {
            out.push((kind, text));
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_identifiers(child, source, kind, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn php_constructor_is_dunder_construct() {
        let behavior = CFamilyBehavior::php();
        assert!(behavior.is_constructor("__construct", Some("Widget")));
    }

    #[test]
    fn java_constructor_matches_class_name() {
        let behavior = CFamilyBehavior::java();
        assert!(behavior.is_constructor("Widget", Some("Widget")));
        assert!(!behavior.is_constructor("build", Some("Widget")));
    }

    #[test]
    fn swift_constructor_is_init() {
        let behavior = CFamilyBehavior::swift();
        assert!(behavior.is_constructor("init", Some("Widget")));
    }
}
