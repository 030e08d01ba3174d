//! Memory bank layout configuration.
//!
//! Defaults describe the standard layout: six core documents under
//! `memory-bank/` and the index at `.github/copilot-instructions.md`.
//! A project may override them with a `.memory-bank.toml` at its root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MemoryBankError, Result};

pub const CONFIG_FILENAME: &str = ".memory-bank.toml";

pub const CORE_FILES: [&str; 6] = [
    "projectbrief.md",
    "productContext.md",
    "activeContext.md",
    "systemPatterns.md",
    "techContext.md",
    "progress.md",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BankConfig {
    /// Documentation root, relative to the project root
    pub docs_dir: String,
    /// Index document, relative to the project root
    pub index_path: String,
    /// Required top-level documents
    pub core_files: Vec<String>,
    /// Extensions eligible for discovery (without the dot)
    pub extensions: Vec<String>,
    /// Directory names pruned from the structure scan
    pub ignored_dirs: Vec<String>,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            docs_dir: "memory-bank".to_string(),
            index_path: ".github/copilot-instructions.md".to_string(),
            core_files: CORE_FILES.iter().map(|s| s.to_string()).collect(),
            extensions: vec!["md".to_string()],
            ignored_dirs: ["node_modules", ".git", "target", "dist", "build", "coverage"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BankConfig {
    /// Load `.memory-bank.toml` from the project root, falling back to defaults
    /// when the file does not exist.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| MemoryBankError::from_io(e, &path))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded memory bank config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: BankConfig =
            toml::from_str(content).map_err(|e| MemoryBankError::Config(e.to_string()))?;
        if config.docs_dir.trim().is_empty() {
            return Err(MemoryBankError::Config("docs_dir must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn with_docs_dir(mut self, docs_dir: impl Into<String>) -> Self {
        self.docs_dir = docs_dir.into();
        self
    }

    pub fn with_index_path(mut self, index_path: impl Into<String>) -> Self {
        self.index_path = index_path.into();
        self
    }

    pub fn docs_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.docs_dir)
    }

    pub fn index_file(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.index_path)
    }

    pub fn is_core(&self, relative_path: &str) -> bool {
        self.core_files.iter().any(|c| c == relative_path)
    }

    pub fn is_eligible(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Prefix (`memory-bank/`) that marks an index token as pointing into the bank
    pub fn docs_prefix(&self) -> String {
        format!("{}/", self.docs_dir.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_has_six_core_files() {
        let config = BankConfig::default();
        assert_eq!(config.core_files.len(), 6);
        assert!(config.is_core("projectbrief.md"));
        assert!(!config.is_core("features/auth.md"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, BankConfig::default());
    }

    #[test]
    fn test_load_partial_override() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "docs_dir = \"docs/bank\"\nextensions = [\"md\", \"mdx\"]\n",
        )
        .unwrap();

        let config = BankConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.docs_dir, "docs/bank");
        assert_eq!(config.index_path, ".github/copilot-instructions.md");
        assert!(config.is_eligible("intro.mdx"));
        assert_eq!(config.docs_prefix(), "docs/bank/");
    }

    #[test]
    fn test_malformed_config_is_error() {
        let result = BankConfig::from_toml("docs_dir = [");
        assert!(matches!(result, Err(MemoryBankError::Config(_))));
    }

    #[test]
    fn test_is_eligible_case_insensitive() {
        let config = BankConfig::default();
        assert!(config.is_eligible("NOTES.MD"));
        assert!(!config.is_eligible("notes.txt"));
        assert!(!config.is_eligible("README"));
    }
}
