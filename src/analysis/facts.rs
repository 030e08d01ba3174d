//! Fact records produced by source analysis.

use serde::{Deserialize, Serialize};

/// Everything extracted from one source file.
///
/// `parse_succeeded == false` always comes with empty function, class and
/// import lists and a populated `parse_error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFact {
    pub file_path: String,
    pub language: String,
    pub functions: Vec<FunctionFact>,
    pub classes: Vec<ClassFact>,
    pub imports: Vec<ImportFact>,
    pub parse_succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    pub line_count: usize,
}

impl SourceFact {
    pub fn new(file_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            language: language.into(),
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            parse_succeeded: true,
            parse_error: None,
            line_count: 0,
        }
    }

    pub fn failed(
        file_path: impl Into<String>,
        language: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            parse_succeeded: false,
            parse_error: Some(error.into()),
            ..Self::new(file_path, language)
        }
    }

    /// Top-level functions followed by class methods.
    pub fn all_functions(&self) -> impl Iterator<Item = &FunctionFact> {
        self.functions
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
    }

    pub fn imports_module(&self, module: &str) -> bool {
        self.imports.iter().any(|i| i.module_path == module)
    }

    pub fn imports_module_prefix(&self, prefix: &str) -> bool {
        self.imports.iter().any(|i| i.module_path.starts_with(prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionFact {
    pub name: String,
    pub is_exported: bool,
    pub parameters: Vec<ParameterFact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub is_async: bool,
    /// Cyclomatic-style score, never below 1
    pub complexity: u32,
    /// 1-based line of the declaration
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterFact {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFact {
    pub name: String,
    pub is_exported: bool,
    pub methods: Vec<FunctionFact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    Default,
    Named,
    Namespace,
    SideEffect,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Default => "default",
            ImportKind::Named => "named",
            ImportKind::Namespace => "namespace",
            ImportKind::SideEffect => "side-effect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFact {
    pub module_path: String,
    pub import_kind: ImportKind,
    pub is_external: bool,
}

impl ImportFact {
    pub fn new(module_path: impl Into<String>, import_kind: ImportKind) -> Self {
        let module_path = module_path.into();
        let is_external = is_external_module(&module_path);
        Self {
            module_path,
            import_kind,
            is_external,
        }
    }
}

/// A module path is internal when it resolves relative to the importing file
/// or from the project root.
pub fn is_external_module(module_path: &str) -> bool {
    !(module_path.starts_with('.') || module_path.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_fact_is_empty() {
        let fact = SourceFact::failed("a.ts", "typescript", "syntax error");
        assert!(!fact.parse_succeeded);
        assert!(fact.functions.is_empty());
        assert!(fact.classes.is_empty());
        assert!(fact.imports.is_empty());
        assert_eq!(fact.parse_error.as_deref(), Some("syntax error"));
    }

    #[test]
    fn test_is_external_module() {
        assert!(is_external_module("express"));
        assert!(is_external_module("@modelcontextprotocol/sdk/server"));
        assert!(!is_external_module("./utils"));
        assert!(!is_external_module("../lib/db"));
        assert!(!is_external_module("/abs/path"));
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let fact = SourceFact::new("a.ts", "typescript");
        let json = serde_json::to_value(&fact).unwrap();
        assert!(json.get("filePath").is_some());
        assert!(json.get("parseSucceeded").is_some());
        assert!(json.get("parseError").is_none());
    }

    #[test]
    fn test_import_kind_serialization() {
        let json = serde_json::to_string(&ImportKind::SideEffect).unwrap();
        assert_eq!(json, "\"side-effect\"");
    }
}
