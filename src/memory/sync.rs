//! Cross-referencing the memory bank against the index document.
//!
//! Every known document name is looked up in the index text literally, so
//! names with spaces or non-ASCII characters match too. A mention counts only
//! when it is not glued to other path characters, optionally behind `./` or
//! the `<docs_dir>/` prefix. A mention of `activeContext.md` is therefore
//! never a reference to `context.md`. Unknown names are picked up only when
//! they explicitly point into the docs directory.

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::config::BankConfig;
use crate::error::{MemoryBankError, Result};
use crate::memory::discovery::MemoryBankDiscoverer;
use crate::memory::fs::BankFs;

static DOCUMENT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_./-]*[A-Za-z0-9_-]\.[A-Za-z0-9]+\b").unwrap());

/// Minimum similarity for a "did you mean" hint on a stale reference
const HINT_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub memory_bank_files: Vec<String>,
    pub copilot_references: Vec<String>,
    /// Discovered documents the index never mentions
    pub missing_references: Vec<String>,
    /// Index mentions with no document on disk
    pub orphaned_references: Vec<String>,
    pub is_in_sync: bool,
    pub index_exists: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    MissingReferences,
    OrphanedReferences,
    Both,
    StructureMismatch,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::MissingReferences => "missing-references",
            ConflictKind::OrphanedReferences => "orphaned-references",
            ConflictKind::Both => "both",
            ConflictKind::StructureMismatch => "structure-mismatch",
        }
    }
}

/// Severity of a conflict, and impact of a single file or action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Corrective action kinds. Declaration order is the planner's execution
/// order, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    AddReference,
    RemoveReference,
    CreateFile,
    UpdateStructure,
    DeleteFile,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::AddReference => "add-reference",
            ActionType::RemoveReference => "remove-reference",
            ActionType::CreateFile => "create-file",
            ActionType::UpdateStructure => "update-structure",
            ActionType::DeleteFile => "delete-file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add-reference" => Some(ActionType::AddReference),
            "remove-reference" => Some(ActionType::RemoveReference),
            "create-file" => Some(ActionType::CreateFile),
            "update-structure" => Some(ActionType::UpdateStructure),
            "delete-file" => Some(ActionType::DeleteFile),
            _ => None,
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(self, ActionType::DeleteFile)
    }

    /// Fixable by editing the index alone
    pub fn is_reference_edit(&self) -> bool {
        matches!(self, ActionType::AddReference | ActionType::RemoveReference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConflictInfo {
    /// Document path relative to the docs root
    pub file_name: String,
    /// Document path relative to the project root
    pub file_path: String,
    pub impact: Severity,
    pub suggested_action: String,
    pub action_type: ActionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    pub kind: ConflictKind,
    pub severity: Severity,
    pub missing_files: Vec<FileConflictInfo>,
    pub orphaned_files: Vec<FileConflictInfo>,
    #[serde(default)]
    pub structure_issues: Vec<FileConflictInfo>,
    pub auto_resolvable: bool,
}

impl SyncConflict {
    pub fn all_files(&self) -> impl Iterator<Item = &FileConflictInfo> {
        self.missing_files
            .iter()
            .chain(self.orphaned_files.iter())
            .chain(self.structure_issues.iter())
    }
}

/// Reconciliation state at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub report: SyncReport,
    pub conflict: Option<SyncConflict>,
}

pub struct SyncReconciler {
    config: BankConfig,
    docs_prefix: String,
}

impl SyncReconciler {
    pub fn new(config: &BankConfig) -> Self {
        Self {
            config: config.clone(),
            docs_prefix: config.docs_prefix(),
        }
    }

    /// Discover the bank, read the index and reconcile the two.
    pub fn check(&self, fs: &dyn BankFs, project_root: &Path) -> Result<SyncSnapshot> {
        let files = MemoryBankDiscoverer::new(fs, &self.config)
            .discover(&self.config.docs_root(project_root))?;

        let index_path = self.config.index_file(project_root);
        let index_text = fs
            .read_optional(&index_path)
            .map_err(|e| MemoryBankError::from_io(e, &index_path))?;

        let report = self.reconcile(&files, index_text.as_deref());
        let conflict = self.detect(&report);
        Ok(SyncSnapshot { report, conflict })
    }

    pub fn reconcile(&self, memory_bank_files: &[String], index_text: Option<&str>) -> SyncReport {
        let files: BTreeSet<String> = memory_bank_files.iter().cloned().collect();

        let references: BTreeSet<String> = match index_text {
            Some(text) => self.extract_references(text, &files).into_iter().collect(),
            None => BTreeSet::new(),
        };

        let missing_references: Vec<String> = files.difference(&references).cloned().collect();
        let orphaned_references: Vec<String> = references.difference(&files).cloned().collect();
        let is_in_sync = missing_references.is_empty() && orphaned_references.is_empty();

        tracing::debug!(
            "Reconciled {} files against {} references: {} missing, {} orphaned",
            files.len(),
            references.len(),
            missing_references.len(),
            orphaned_references.len()
        );

        SyncReport {
            memory_bank_files: files.into_iter().collect(),
            copilot_references: references.into_iter().collect(),
            missing_references,
            orphaned_references,
            is_in_sync,
            index_exists: index_text.is_some(),
        }
    }

    /// Document names the index text refers to, sorted and deduplicated.
    pub fn extract_references(&self, index_text: &str, discovered: &BTreeSet<String>) -> Vec<String> {
        let mut references = BTreeSet::new();

        // prefixed tokens surface references to documents that no longer exist
        for token in DOCUMENT_TOKEN.find_iter(index_text) {
            if let Some(name) = self.prefixed_reference(token.as_str()) {
                references.insert(name.to_string());
            }
        }

        for name in discovered.iter().chain(self.config.core_files.iter()) {
            if !references.contains(name) && self.mentions(index_text, name) {
                references.insert(name.clone());
            }
        }

        references.into_iter().collect()
    }

    /// Whether one line of index text refers to `name`.
    pub fn line_references(&self, line: &str, name: &str) -> bool {
        self.mentions(line, name)
    }

    fn mentions(&self, text: &str, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        let pattern = format!(
            r"(?:^|[^\w./-])(?:\.{{0,2}}/)*(?:{})?{}(?:$|[^\w./-]|\.(?:$|[^\w]))",
            regex::escape(&self.docs_prefix),
            regex::escape(name)
        );
        match Regex::new(&pattern) {
            Ok(re) => re.is_match(text),
            Err(e) => {
                tracing::warn!("Cannot match {} in the index: {}", name, e);
                false
            }
        }
    }

    fn prefixed_reference<'t>(&self, token: &'t str) -> Option<&'t str> {
        if !self.config.is_eligible(token) {
            return None;
        }

        let mut name = token;
        while let Some(rest) = name
            .strip_prefix("./")
            .or_else(|| name.strip_prefix("../"))
            .or_else(|| name.strip_prefix('/'))
        {
            name = rest;
        }

        let name = name.strip_prefix(self.docs_prefix.as_str())?;
        if name.is_empty() || name.split('/').any(|c| c == ".." || c == "." || c.is_empty()) {
            return None;
        }
        Some(name)
    }

    /// Reference conflict when the report is out of sync.
    pub fn build_conflict(&self, report: &SyncReport) -> Option<SyncConflict> {
        if report.is_in_sync {
            return None;
        }

        let missing_files: Vec<FileConflictInfo> = report
            .missing_references
            .iter()
            .map(|name| self.missing_info(name))
            .collect();
        let orphaned_files: Vec<FileConflictInfo> = report
            .orphaned_references
            .iter()
            .map(|name| self.orphaned_info(name, &report.memory_bank_files))
            .collect();

        let kind = match (missing_files.is_empty(), orphaned_files.is_empty()) {
            (false, false) => ConflictKind::Both,
            (false, true) => ConflictKind::MissingReferences,
            (true, false) => ConflictKind::OrphanedReferences,
            (true, true) => return None,
        };

        let severity = self.severity(&missing_files, &orphaned_files);
        let auto_resolvable = missing_files
            .iter()
            .chain(orphaned_files.iter())
            .all(|info| info.action_type.is_reference_edit());

        Some(SyncConflict {
            kind,
            severity,
            missing_files,
            orphaned_files,
            structure_issues: Vec::new(),
            auto_resolvable,
        })
    }

    /// References agree but core documents are absent from disk.
    pub fn structure_conflict(&self, report: &SyncReport) -> Option<SyncConflict> {
        if !report.is_in_sync {
            return None;
        }

        let structure_issues: Vec<FileConflictInfo> = self
            .config
            .core_files
            .iter()
            .filter(|core| !report.memory_bank_files.contains(core))
            .map(|core| FileConflictInfo {
                file_name: core.clone(),
                file_path: self.project_path(core),
                impact: Severity::High,
                suggested_action: format!("Create the core document {}", self.project_path(core)),
                action_type: ActionType::CreateFile,
            })
            .collect();

        if structure_issues.is_empty() {
            return None;
        }

        Some(SyncConflict {
            kind: ConflictKind::StructureMismatch,
            severity: Severity::High,
            missing_files: Vec::new(),
            orphaned_files: Vec::new(),
            structure_issues,
            auto_resolvable: false,
        })
    }

    pub fn detect(&self, report: &SyncReport) -> Option<SyncConflict> {
        self.build_conflict(report)
            .or_else(|| self.structure_conflict(report))
    }

    fn severity(&self, missing: &[FileConflictInfo], orphaned: &[FileConflictInfo]) -> Severity {
        if missing.iter().any(|info| self.config.is_core(&info.file_name)) {
            return Severity::High;
        }

        let non_core = missing
            .iter()
            .chain(orphaned.iter())
            .filter(|info| !self.config.is_core(&info.file_name))
            .count();

        if non_core > 2 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    fn missing_info(&self, name: &str) -> FileConflictInfo {
        let impact = if self.config.is_core(name) {
            Severity::High
        } else {
            Severity::Low
        };

        FileConflictInfo {
            file_name: name.to_string(),
            file_path: self.project_path(name),
            impact,
            suggested_action: format!(
                "Add a reference to {} in {}",
                self.project_path(name),
                self.config.index_path
            ),
            action_type: ActionType::AddReference,
        }
    }

    fn orphaned_info(&self, name: &str, memory_bank_files: &[String]) -> FileConflictInfo {
        if self.config.is_core(name) {
            return FileConflictInfo {
                file_name: name.to_string(),
                file_path: self.project_path(name),
                impact: Severity::High,
                suggested_action: format!("Create the missing core document {}", self.project_path(name)),
                action_type: ActionType::CreateFile,
            };
        }

        let mut suggested_action = format!(
            "Remove the stale reference to {} from {}",
            self.project_path(name),
            self.config.index_path
        );
        if let Some(similar) = closest_match(name, memory_bank_files) {
            suggested_action.push_str(&format!(" (did you mean {}?)", similar));
        }

        FileConflictInfo {
            file_name: name.to_string(),
            file_path: self.project_path(name),
            impact: Severity::Low,
            suggested_action,
            action_type: ActionType::RemoveReference,
        }
    }

    fn project_path(&self, name: &str) -> String {
        format!("{}{}", self.docs_prefix, name)
    }
}

fn closest_match<'a>(name: &str, candidates: &'a [String]) -> Option<&'a str> {
    let name = name.to_lowercase();
    candidates
        .iter()
        .map(|c| (c, jaro_winkler(&name, &c.to_lowercase())))
        .filter(|(_, score)| *score >= HINT_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| c.as_str())
}
