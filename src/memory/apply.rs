use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::config::BankConfig;
use crate::error::{MemoryBankError, Result};
use crate::memory::discovery::MemoryBankDiscoverer;
use crate::memory::fs::BankFs;
use crate::memory::planner::ConflictAction;
use crate::memory::sync::{ActionType, SyncReconciler};

/// Index section that collects document references
pub const INDEX_SECTION: &str = "## Memory Bank Files";

/// Applies planned actions to the memory bank and its index.
pub struct ActionApplier<'a> {
    fs: &'a dyn BankFs,
    config: &'a BankConfig,
    project_root: &'a Path,
    reconciler: SyncReconciler,
}

impl<'a> ActionApplier<'a> {
    pub fn new(fs: &'a dyn BankFs, config: &'a BankConfig, project_root: &'a Path) -> Self {
        Self {
            fs,
            config,
            project_root,
            reconciler: SyncReconciler::new(config),
        }
    }

    pub fn apply(&self, action: &ConflictAction) -> Result<()> {
        tracing::debug!("Applying {} {}", action.action_type.as_str(), action.target_file);

        match action.action_type {
            ActionType::AddReference => self.add_references(&[action.target_file.clone()]),
            ActionType::RemoveReference => self.remove_reference(&action.target_file),
            ActionType::CreateFile => self.create_file(&action.target_file),
            ActionType::DeleteFile => self.delete_file(&action.target_file),
            ActionType::UpdateStructure => self.update_structure(),
        }
    }

    /// Append references for `names` under the index section, creating the
    /// index or the section when absent. Names already referenced are skipped.
    pub fn add_references(&self, names: &[String]) -> Result<()> {
        let index_path = self.config.index_file(self.project_root);
        let content = self.read_index(&index_path)?.unwrap_or_default();

        let known: BTreeSet<String> = names.iter().cloned().collect();
        let existing: BTreeSet<String> = self
            .reconciler
            .extract_references(&content, &known)
            .into_iter()
            .collect();

        let mut additions: Vec<String> = Vec::new();
        for name in names {
            self.document_path(name)?;
            if !existing.contains(name) && !additions.contains(name) {
                additions.push(name.clone());
            }
        }
        if additions.is_empty() {
            return Ok(());
        }

        let entries: Vec<String> = additions
            .iter()
            .map(|name| format!("- `{}{}`", self.config.docs_prefix(), name))
            .collect();

        let mut lines: Vec<String> = content.lines().map(String::from).collect();
        match lines.iter().position(|l| l.trim() == INDEX_SECTION) {
            Some(heading) => {
                let mut end = lines[heading + 1..]
                    .iter()
                    .position(|l| l.starts_with('#'))
                    .map(|offset| heading + 1 + offset)
                    .unwrap_or(lines.len());
                while end > heading + 1 && lines[end - 1].trim().is_empty() {
                    end -= 1;
                }
                if end == heading + 1 {
                    lines.insert(end, String::new());
                    end += 1;
                }
                for (offset, entry) in entries.into_iter().enumerate() {
                    lines.insert(end + offset, entry);
                }
            }
            None => {
                if lines.last().map(|l| !l.trim().is_empty()).unwrap_or(false) {
                    lines.push(String::new());
                }
                lines.push(INDEX_SECTION.to_string());
                lines.push(String::new());
                lines.extend(entries);
            }
        }

        self.write_index(&index_path, &lines)?;
        tracing::info!("Added {} references to {}", additions.len(), self.config.index_path);
        Ok(())
    }

    /// Drop every index line that refers to `name`.
    pub fn remove_reference(&self, name: &str) -> Result<()> {
        let index_path = self.config.index_file(self.project_root);
        let Some(content) = self.read_index(&index_path)? else {
            return Ok(());
        };

        let lines: Vec<String> = content.lines().map(String::from).collect();
        let kept: Vec<String> = lines
            .iter()
            .filter(|line| !self.reconciler.line_references(line, name))
            .cloned()
            .collect();

        if kept.len() == lines.len() {
            tracing::debug!("No reference to {} in the index", name);
            return Ok(());
        }

        self.write_index(&index_path, &kept)?;
        tracing::info!("Removed {} reference lines for {}", lines.len() - kept.len(), name);
        Ok(())
    }

    /// Write a title-only stub. An existing document is left untouched.
    pub fn create_file(&self, name: &str) -> Result<()> {
        let path = self.document_path(name)?;
        if self.fs.is_file(&path) {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| MemoryBankError::from_io(e, parent))?;
        }
        self.fs
            .write(&path, &format!("# {}\n", document_title(name)))
            .map_err(|e| MemoryBankError::from_io(e, &path))?;

        tracing::info!("Created {}", path.display());
        Ok(())
    }

    pub fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.document_path(name)?;
        self.fs
            .remove_file(&path)
            .map_err(|e| MemoryBankError::from_io(e, &path))?;

        tracing::info!("Deleted {}", path.display());
        Ok(())
    }

    /// Reference every discovered document the index does not mention yet.
    pub fn update_structure(&self) -> Result<()> {
        let files = MemoryBankDiscoverer::new(self.fs, self.config)
            .discover(&self.config.docs_root(self.project_root))?;

        let index_path = self.config.index_file(self.project_root);
        let content = self.read_index(&index_path)?;
        let report = self.reconciler.reconcile(&files, content.as_deref());

        self.add_references(&report.missing_references)
    }

    fn document_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(MemoryBankError::InvalidPath(name.to_string()));
        }
        Ok(self.config.docs_root(self.project_root).join(relative))
    }

    fn read_index(&self, index_path: &Path) -> Result<Option<String>> {
        self.fs
            .read_optional(index_path)
            .map_err(|e| MemoryBankError::from_io(e, index_path))
    }

    fn write_index(&self, index_path: &Path, lines: &[String]) -> Result<()> {
        if let Some(parent) = index_path.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| MemoryBankError::from_io(e, parent))?;
        }

        let mut content = lines.join("\n");
        content.push('\n');
        self.fs
            .write(index_path, &content)
            .map_err(|e| MemoryBankError::from_io(e, index_path))
    }
}

/// `features/productContext.md` -> `Product Context`
fn document_title(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());

    let mut spaced = String::with_capacity(stem.len() + 4);
    let mut previous_lower = false;
    for ch in stem.chars() {
        if ch == '-' || ch == '_' {
            spaced.push(' ');
            previous_lower = false;
            continue;
        }
        if ch.is_uppercase() && previous_lower {
            spaced.push(' ');
        }
        previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        spaced.push(ch);
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
