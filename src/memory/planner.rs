use serde::{Deserialize, Serialize};

use crate::config::BankConfig;
use crate::memory::sync::{ActionType, ConflictKind, Severity, SyncConflict, SyncSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictAction {
    pub action_type: ActionType,
    pub target_file: String,
    pub impact: Severity,
    pub requires_confirmation: bool,
    pub description: String,
}

impl ConflictAction {
    /// Confirmation is required for destructive or high-impact actions.
    pub fn new(
        action_type: ActionType,
        target_file: impl Into<String>,
        impact: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target_file: target_file.into(),
            impact,
            requires_confirmation: action_type.is_destructive() || impact == Severity::High,
            description: description.into(),
        }
    }
}

/// Turns a conflict into an ordered list of corrective actions.
///
/// Actions are sorted by type (add-reference, remove-reference, create-file,
/// update-structure, delete-file), then by target file. The same type and
/// target never appear twice.
pub struct ConflictPlanner {
    index_path: String,
}

impl ConflictPlanner {
    pub fn new(config: &BankConfig) -> Self {
        Self {
            index_path: config.index_path.clone(),
        }
    }

    pub fn plan(&self, conflict: &SyncConflict) -> Vec<ConflictAction> {
        let mut actions: Vec<ConflictAction> = conflict
            .all_files()
            .map(|info| {
                ConflictAction::new(
                    info.action_type,
                    info.file_name.clone(),
                    info.impact,
                    info.suggested_action.clone(),
                )
            })
            .collect();

        if conflict.kind == ConflictKind::StructureMismatch {
            actions.push(ConflictAction::new(
                ActionType::UpdateStructure,
                self.index_path.clone(),
                Severity::Medium,
                format!("Reference every memory bank document in {}", self.index_path),
            ));
        }

        actions.sort_by(|a, b| {
            a.action_type
                .cmp(&b.action_type)
                .then_with(|| a.target_file.cmp(&b.target_file))
                .then_with(|| b.impact.cmp(&a.impact))
        });
        actions.dedup_by(|a, b| a.action_type == b.action_type && a.target_file == b.target_file);

        tracing::debug!("Planned {} actions for {} conflict", actions.len(), conflict.kind.as_str());
        actions
    }

    /// Nothing to do when the snapshot carries no conflict.
    pub fn plan_snapshot(&self, snapshot: &SyncSnapshot) -> Vec<ConflictAction> {
        snapshot
            .conflict
            .as_ref()
            .map(|conflict| self.plan(conflict))
            .unwrap_or_default()
    }
}
