use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::BankConfig;
use crate::error::{MemoryBankError, Result};
use crate::memory::discovery::MemoryBankDiscoverer;
use crate::memory::fs::BankFs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organization {
    /// Every document sits at the docs root
    Flat,
    /// Documents grouped into topic folders
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankStructure {
    pub organization: Organization,
    pub folders: Vec<String>,
    pub folder_count: usize,
    pub total_files: usize,
    pub root_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// All core documents are present
    pub is_valid: bool,
    pub existing_files: Vec<String>,
    pub missing_files: Vec<String>,
    /// The index document exists
    pub copilot_integration: bool,
    pub structure: BankStructure,
}

pub struct MemoryBankValidator<'a> {
    fs: &'a dyn BankFs,
    config: &'a BankConfig,
}

impl<'a> MemoryBankValidator<'a> {
    pub fn new(fs: &'a dyn BankFs, config: &'a BankConfig) -> Self {
        Self { fs, config }
    }

    pub fn validate(&self, project_root: &Path) -> Result<ValidationReport> {
        let docs_root = self.config.docs_root(project_root);
        let files = MemoryBankDiscoverer::new(self.fs, self.config).discover(&docs_root)?;

        let (existing_files, missing_files): (Vec<String>, Vec<String>) = self
            .config
            .core_files
            .iter()
            .cloned()
            .partition(|core| files.contains(core));

        let copilot_integration = self.fs.is_file(&self.config.index_file(project_root));
        let structure = self.structure(&docs_root, &files)?;

        tracing::debug!(
            "Validated memory bank: {} of {} core files present",
            existing_files.len(),
            self.config.core_files.len()
        );

        Ok(ValidationReport {
            is_valid: missing_files.is_empty(),
            existing_files,
            missing_files,
            copilot_integration,
            structure,
        })
    }

    fn structure(&self, docs_root: &Path, files: &[String]) -> Result<BankStructure> {
        let entries = match self.fs.read_dir(docs_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(MemoryBankError::from_io(e, docs_root)),
        };

        let mut folders: Vec<String> = entries
            .into_iter()
            .filter(|e| e.is_dir && !e.is_symlink && !e.is_hidden())
            .map(|e| e.name)
            .collect();
        folders.sort();

        let root_files: Vec<String> = files.iter().filter(|f| !f.contains('/')).cloned().collect();
        let organization = if folders.is_empty() {
            Organization::Flat
        } else {
            Organization::Semantic
        };

        Ok(BankStructure {
            organization,
            folder_count: folders.len(),
            folders,
            total_files: files.len(),
            root_files,
        })
    }
}
