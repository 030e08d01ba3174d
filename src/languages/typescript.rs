use super::LanguageGrammar;

pub struct TypeScriptGrammar;

impl LanguageGrammar for TypeScriptGrammar {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["ts", "mts", "cts"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }
}

pub struct TsxGrammar;

impl LanguageGrammar for TsxGrammar {
    fn name(&self) -> &'static str {
        "tsx"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["tsx"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }
}

/// Plain JavaScript goes through the TSX grammar, which accepts JSX and is a
/// superset of the ECMAScript syntax we extract.
pub struct JavaScriptGrammar;

impl LanguageGrammar for JavaScriptGrammar {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }
}
