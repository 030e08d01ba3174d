use std::path::Path;
use std::sync::Arc;

use crate::error::{MemoryBankError, Result};
use crate::languages::{LanguageGrammar, LanguageRegistry};

pub struct Parser {
    registry: LanguageRegistry,
}

impl Parser {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    pub fn parse_source(&self, source: &str, grammar: Arc<dyn LanguageGrammar>) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|e| MemoryBankError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| MemoryBankError::Parse("Failed to parse source".to_string()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
            language: grammar.name().to_string(),
        })
    }

    pub fn get_grammar(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        self.registry.get_for_file(path)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(LanguageRegistry::new())
    }
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub language: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }

    /// First ERROR or MISSING node in document order, if the tree has any.
    pub fn first_error(&self) -> Option<tree_sitter::Node<'_>> {
        let root = self.root_node();
        if !root.has_error() {
            return None;
        }
        find_error(root)
    }
}

fn find_error(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    for child in node.children(&mut node.walk()) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = find_error(child) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(name: &str) -> Arc<dyn LanguageGrammar> {
        LanguageRegistry::new().get_by_name(name).unwrap()
    }

    #[test]
    fn test_parse_source_typescript() {
        let parser = Parser::default();
        let source = r#"
function greet(name: string): string {
    return `Hello, ${name}!`;
}
"#;

        let parsed = parser.parse_source(source, grammar("typescript")).unwrap();
        assert_eq!(parsed.language, "typescript");
        assert_eq!(parsed.root_node().kind(), "program");
        assert!(parsed.first_error().is_none());
    }

    #[test]
    fn test_parse_source_jsx() {
        let parser = Parser::default();
        let source = "export const App = () => <div className=\"app\">hi</div>;";
        let parsed = parser.parse_source(source, grammar("javascript")).unwrap();
        assert!(parsed.first_error().is_none());
    }

    #[test]
    fn test_parse_source_empty() {
        let parser = Parser::default();
        let parsed = parser.parse_source("", grammar("typescript")).unwrap();
        assert_eq!(parsed.source, "");
        assert!(parsed.first_error().is_none());
    }

    #[test]
    fn test_first_error_reports_broken_source() {
        let parser = Parser::default();
        let parsed = parser
            .parse_source("function broken( {\n  return 1;\n", grammar("typescript"))
            .unwrap();
        assert!(parsed.first_error().is_some());
    }

    #[test]
    fn test_parsed_file_node_text() {
        let parser = Parser::default();
        let source = "const x = 1;";
        let parsed = parser.parse_source(source, grammar("typescript")).unwrap();
        let root = parsed.root_node();
        assert_eq!(parsed.node_text(&root), source);
    }

    #[test]
    fn test_get_grammar() {
        let parser = Parser::default();
        assert_eq!(parser.get_grammar(Path::new("a.tsx")).unwrap().name(), "tsx");
        assert!(parser.get_grammar(Path::new("data.json")).is_none());
    }
}
