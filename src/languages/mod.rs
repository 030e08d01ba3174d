//! Tree-sitter grammars for the source languages fact extraction understands.

pub mod typescript;

use std::path::Path;
use std::sync::Arc;

pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}

/// TypeScript, TSX and JavaScript grammars, looked up by name or extension.
pub struct LanguageRegistry {
    grammars: Vec<Arc<dyn LanguageGrammar>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            grammars: vec![
                Arc::new(typescript::TypeScriptGrammar),
                Arc::new(typescript::TsxGrammar),
                Arc::new(typescript::JavaScriptGrammar),
            ],
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.grammars.iter().find(|g| g.name() == name).cloned()
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.grammars.iter().find(|g| g.handles_extension(ext)).cloned()
    }

    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        let ext = path.extension()?.to_str()?;
        self.get_by_extension(ext)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
