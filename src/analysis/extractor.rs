use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tree_sitter::Node;

use crate::analysis::complexity::cyclomatic_complexity;
use crate::analysis::facts::{ClassFact, FunctionFact, ImportFact, ImportKind, ParameterFact, SourceFact};
use crate::analysis::parser::{ParsedFile, Parser};
use crate::languages::{LanguageGrammar, LanguageRegistry};

/// Turns one source file into a [`SourceFact`].
///
/// Only top-level declarations and class members are visited. Extraction
/// never fails: syntax errors and unsupported files produce a fact with
/// `parse_succeeded == false`.
pub struct SourceFactExtractor {
    parser: Parser,
}

impl SourceFactExtractor {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(LanguageRegistry::new()),
        }
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.parser.get_grammar(path).is_some()
    }

    pub fn extract(&self, file_path: &str, source: &str) -> SourceFact {
        match self.parser.get_grammar(Path::new(file_path)) {
            Some(grammar) => self.extract_with(file_path, source, grammar),
            None => SourceFact::failed(file_path, "unknown", "Unsupported language"),
        }
    }

    pub fn extract_with(
        &self,
        file_path: &str,
        source: &str,
        grammar: Arc<dyn LanguageGrammar>,
    ) -> SourceFact {
        let language = grammar.name();
        let parsed = match self.parser.parse_source(source, grammar) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", file_path, e);
                return SourceFact::failed(file_path, language, e.to_string());
            }
        };

        if let Some(error) = parsed.first_error() {
            let message = syntax_error_message(&parsed, &error);
            tracing::debug!("{}: {}", file_path, message);
            let mut fact = SourceFact::failed(file_path, language, message);
            fact.line_count = source.lines().count();
            return fact;
        }

        let mut fact = SourceFact::new(file_path, language);
        fact.line_count = source.lines().count();

        let root = parsed.root_node();
        let exported_names = collect_exported_names(&parsed, root);

        for child in root.named_children(&mut root.walk()) {
            self.visit_top_level(&parsed, child, false, &exported_names, &mut fact);
        }

        fact
    }

    fn visit_top_level(
        &self,
        parsed: &ParsedFile,
        node: Node,
        exported: bool,
        exported_names: &HashSet<String>,
        fact: &mut SourceFact,
    ) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = field_text(parsed, node, "name") {
                    let is_exported = exported || exported_names.contains(name);
                    fact.functions.push(function_fact(parsed, node, name, is_exported));
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = field_text(parsed, node, "name") {
                    let is_exported = exported || exported_names.contains(name);
                    fact.classes.push(class_fact(parsed, node, name, is_exported));
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                for declarator in node.named_children(&mut node.walk()) {
                    if declarator.kind() == "variable_declarator" {
                        self.visit_declarator(parsed, declarator, exported, exported_names, fact);
                    }
                }
            }
            "export_statement" => self.visit_export(parsed, node, exported_names, fact),
            "import_statement" => fact.imports.extend(import_facts(parsed, node)),
            _ => {}
        }
    }

    fn visit_declarator(
        &self,
        parsed: &ParsedFile,
        declarator: Node,
        exported: bool,
        exported_names: &HashSet<String>,
        fact: &mut SourceFact,
    ) {
        let (Some(name_node), Some(value)) = (
            declarator.child_by_field_name("name"),
            declarator.child_by_field_name("value"),
        ) else {
            return;
        };

        if let Some(module) = require_target(parsed, value) {
            fact.imports.push(ImportFact::new(module, ImportKind::Default));
            return;
        }
        if name_node.kind() != "identifier" {
            return;
        }
        let name = parsed.node_text(&name_node);

        if is_function_value(value) {
            let is_exported = exported || exported_names.contains(name);
            let mut function = function_fact(parsed, value, name, is_exported);
            function.line = line_of(declarator);
            fact.functions.push(function);
        } else if value.kind() == "class" {
            let is_exported = exported || exported_names.contains(name);
            fact.classes.push(class_fact(parsed, value, name, is_exported));
        }
    }

    fn visit_export(
        &self,
        parsed: &ParsedFile,
        node: Node,
        exported_names: &HashSet<String>,
        fact: &mut SourceFact,
    ) {
        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.visit_top_level(parsed, declaration, true, exported_names, fact);
            return;
        }

        // Re-exports pull in another module
        if let Some(source) = node.child_by_field_name("source") {
            let module = string_value(parsed, source);
            let kind = if has_named_child(node, "export_clause") {
                ImportKind::Named
            } else {
                ImportKind::Namespace
            };
            fact.imports.push(ImportFact::new(module, kind));
            return;
        }

        if let Some(value) = node.child_by_field_name("value") {
            if is_function_value(value) {
                let name = field_text(parsed, value, "name").unwrap_or("default");
                fact.functions.push(function_fact(parsed, value, name, true));
            } else if value.kind() == "class" {
                let name = field_text(parsed, value, "name").unwrap_or("default");
                fact.classes.push(class_fact(parsed, value, name, true));
            }
        }
    }
}

impl Default for SourceFactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn syntax_error_message(parsed: &ParsedFile, error: &Node) -> String {
    let position = error.start_position();
    if error.is_missing() {
        format!(
            "Syntax error at line {}, column {}: missing `{}`",
            position.row + 1,
            position.column + 1,
            error.kind()
        )
    } else {
        let snippet: String = parsed.node_text(error).chars().take(40).collect();
        format!(
            "Syntax error at line {}, column {}: unexpected `{}`",
            position.row + 1,
            position.column + 1,
            snippet.trim()
        )
    }
}

/// Names exported through `export { a, b as c }`, `export default name;` or
/// CommonJS `module.exports` assignments.
fn collect_exported_names(parsed: &ParsedFile, root: Node) -> HashSet<String> {
    let mut names = HashSet::new();

    for child in root.named_children(&mut root.walk()) {
        match child.kind() {
            "export_statement" => {
                if child.child_by_field_name("source").is_some()
                    || child.child_by_field_name("declaration").is_some()
                {
                    continue;
                }
                for clause in child.named_children(&mut child.walk()) {
                    if clause.kind() != "export_clause" {
                        continue;
                    }
                    for specifier in clause.named_children(&mut clause.walk()) {
                        if let Some(name) = field_text(parsed, specifier, "name") {
                            names.insert(name.to_string());
                        }
                    }
                }
                if let Some(value) = child.child_by_field_name("value") {
                    if value.kind() == "identifier" {
                        names.insert(parsed.node_text(&value).to_string());
                    }
                }
            }
            "expression_statement" => collect_commonjs_exports(parsed, child, &mut names),
            _ => {}
        }
    }

    names
}

fn collect_commonjs_exports(parsed: &ParsedFile, statement: Node, names: &mut HashSet<String>) {
    let Some(assignment) = statement.named_child(0) else {
        return;
    };
    if assignment.kind() != "assignment_expression" {
        return;
    }
    let (Some(left), Some(right)) = (
        assignment.child_by_field_name("left"),
        assignment.child_by_field_name("right"),
    ) else {
        return;
    };

    let target = parsed.node_text(&left);
    let exports_object = target == "module.exports";
    let exports_member = target.starts_with("module.exports.") || target.starts_with("exports.");
    if !exports_object && !exports_member {
        return;
    }

    match right.kind() {
        "identifier" => {
            names.insert(parsed.node_text(&right).to_string());
        }
        "object" if exports_object => {
            for property in right.named_children(&mut right.walk()) {
                match property.kind() {
                    "shorthand_property_identifier" => {
                        names.insert(parsed.node_text(&property).to_string());
                    }
                    "pair" => {
                        if let Some(value) = property.child_by_field_name("value") {
                            if value.kind() == "identifier" {
                                names.insert(parsed.node_text(&value).to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn function_fact(parsed: &ParsedFile, node: Node, name: &str, is_exported: bool) -> FunctionFact {
    let parameters = match node.child_by_field_name("parameters") {
        Some(params) => parameter_facts(parsed, params),
        // Single-identifier arrow functions: `x => x + 1`
        None => node
            .child_by_field_name("parameter")
            .map(|p| {
                vec![ParameterFact {
                    name: parsed.node_text(&p).to_string(),
                    type_annotation: None,
                }]
            })
            .unwrap_or_default(),
    };

    FunctionFact {
        name: name.to_string(),
        is_exported,
        parameters,
        return_type: node
            .child_by_field_name("return_type")
            .map(|t| type_text(parsed, t)),
        is_async: has_child_kind(node, "async"),
        complexity: cyclomatic_complexity(node.child_by_field_name("body")),
        line: line_of(node),
    }
}

fn parameter_facts(parsed: &ParsedFile, params: Node) -> Vec<ParameterFact> {
    let mut parameters = Vec::new();

    for param in params.named_children(&mut params.walk()) {
        let (name_node, type_node) = match param.kind() {
            "required_parameter" | "optional_parameter" => (
                param.child_by_field_name("pattern"),
                param.child_by_field_name("type"),
            ),
            "assignment_pattern" => (param.child_by_field_name("left"), None),
            "identifier" | "rest_pattern" | "object_pattern" | "array_pattern" => (Some(param), None),
            _ => (None, None),
        };

        if let Some(name_node) = name_node {
            parameters.push(ParameterFact {
                name: parsed.node_text(&name_node).to_string(),
                type_annotation: type_node.map(|t| type_text(parsed, t)),
            });
        }
    }

    parameters
}

fn class_fact(parsed: &ParsedFile, node: Node, name: &str, is_exported: bool) -> ClassFact {
    let mut class = ClassFact {
        name: name.to_string(),
        is_exported,
        methods: Vec::new(),
        extends: None,
    };

    for child in node.named_children(&mut node.walk()) {
        if child.kind() == "class_heritage" {
            class.extends = child
                .named_children(&mut child.walk())
                .find(|c| c.kind() == "extends_clause")
                .and_then(|clause| clause.child_by_field_name("value"))
                .map(|v| parsed.node_text(&v).to_string());
        }
    }

    let Some(body) = node.child_by_field_name("body") else {
        return class;
    };

    for member in body.named_children(&mut body.walk()) {
        let (function_node, name_node) = match member.kind() {
            "method_definition" => (Some(member), member.child_by_field_name("name")),
            "public_field_definition" => (
                member
                    .child_by_field_name("value")
                    .filter(|v| is_function_value(*v)),
                member.child_by_field_name("name"),
            ),
            _ => (None, None),
        };

        let (Some(function_node), Some(name_node)) = (function_node, name_node) else {
            continue;
        };

        let method_name = parsed.node_text(&name_node);
        let is_private = name_node.kind() == "private_property_identifier"
            || member
                .named_children(&mut member.walk())
                .any(|c| c.kind() == "accessibility_modifier" && parsed.node_text(&c) == "private");

        let mut method = function_fact(parsed, function_node, method_name, is_exported && !is_private);
        method.is_async = method.is_async || has_child_kind(member, "async");
        method.line = line_of(member);
        class.methods.push(method);
    }

    class
}

fn import_facts(parsed: &ParsedFile, node: Node) -> Vec<ImportFact> {
    let Some(source) = node.child_by_field_name("source") else {
        // `import fs = require("fs")`
        return node
            .named_children(&mut node.walk())
            .find(|c| c.kind() == "import_require_clause")
            .and_then(|clause| clause.child_by_field_name("source"))
            .map(|s| vec![ImportFact::new(string_value(parsed, s), ImportKind::Default)])
            .unwrap_or_default();
    };
    let module = string_value(parsed, source);

    let Some(clause) = node
        .named_children(&mut node.walk())
        .find(|c| c.kind() == "import_clause")
    else {
        return vec![ImportFact::new(module, ImportKind::SideEffect)];
    };

    let mut kinds = Vec::new();
    for part in clause.named_children(&mut clause.walk()) {
        let kind = match part.kind() {
            "identifier" => ImportKind::Default,
            "namespace_import" => ImportKind::Namespace,
            "named_imports" => ImportKind::Named,
            _ => continue,
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    if kinds.is_empty() {
        kinds.push(ImportKind::SideEffect);
    }

    kinds
        .into_iter()
        .map(|kind| ImportFact::new(module.clone(), kind))
        .collect()
}

/// `require("module")` call with a literal argument.
fn require_target(parsed: &ParsedFile, value: Node) -> Option<String> {
    let call = if value.kind() == "await_expression" {
        value.named_child(0)?
    } else {
        value
    };
    if call.kind() != "call_expression" {
        return None;
    }
    let function = call.child_by_field_name("function")?;
    if parsed.node_text(&function) != "require" {
        return None;
    }
    let arguments = call.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    (first.kind() == "string").then(|| string_value(parsed, first))
}

fn is_function_value(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn field_text<'a>(parsed: &'a ParsedFile, node: Node, field: &str) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| parsed.node_text(&n))
}

fn has_child_kind(node: Node, kind: &str) -> bool {
    node.children(&mut node.walk()).any(|c| c.kind() == kind)
}

fn has_named_child(node: Node, kind: &str) -> bool {
    node.named_children(&mut node.walk()).any(|c| c.kind() == kind)
}

fn string_value(parsed: &ParsedFile, node: Node) -> String {
    parsed
        .node_text(&node)
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

fn type_text(parsed: &ParsedFile, node: Node) -> String {
    parsed
        .node_text(&node)
        .trim_start_matches(':')
        .trim()
        .to_string()
}

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}
