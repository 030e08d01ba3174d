//! Step-by-step resolution of planned actions.
//!
//! The whole conversation lives in a [`ResolutionSession`] that the caller
//! owns and hands back on every call, so a resolution can span several
//! processes (the MCP tool round-trips it as JSON).

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::BankConfig;
use crate::error::{MemoryBankError, Result};
use crate::memory::apply::ActionApplier;
use crate::memory::fs::BankFs;
use crate::memory::planner::ConflictAction;
use crate::memory::sync::{ActionType, SyncReconciler, SyncSnapshot};

pub const SKIP_OPTION: &str = "skip";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverState {
    Idle,
    Presenting,
    AwaitingResponse,
    Applying,
    Completed,
    Aborted,
}

impl ResolverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverState::Idle => "idle",
            ResolverState::Presenting => "presenting",
            ResolverState::AwaitingResponse => "awaiting-response",
            ResolverState::Applying => "applying",
            ResolverState::Completed => "completed",
            ResolverState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolverState::Completed | ResolverState::Aborted)
    }

    fn can_transition_to(&self, next: ResolverState) -> bool {
        use ResolverState::*;

        match (self, next) {
            (Idle, Presenting)
            | (Presenting, AwaitingResponse)
            | (Presenting, Completed)
            | (AwaitingResponse, Applying)
            | (Applying, Presenting) => true,
            (from, Aborted) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Question,
    Information,
    Confirmation,
    Warning,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStep {
    /// Starts at 1, increases by 1 per step
    pub step: u32,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_response: Option<String>,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChoice {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_action: Option<ConflictAction>,
}

/// Resumable resolver state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSession {
    pub id: String,
    pub state: ResolverState,
    pub actions: Vec<ConflictAction>,
    /// Index of the action being presented
    pub cursor: usize,
    pub conversation_log: Vec<ConversationStep>,
    pub actions_performed: Vec<ConflictAction>,
    pub user_choices: Vec<UserChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_state: Option<SyncSnapshot>,
}

impl ResolutionSession {
    pub fn new(actions: Vec<ConflictAction>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: ResolverState::Idle,
            actions,
            cursor: 0,
            conversation_log: Vec::new(),
            actions_performed: Vec::new(),
            user_choices: Vec::new(),
            final_state: None,
        }
    }

    pub fn current_action(&self) -> Option<&ConflictAction> {
        self.actions.get(self.cursor)
    }

    /// Options offered by the open question, if any
    pub fn pending_options(&self) -> Option<&[String]> {
        if self.state != ResolverState::AwaitingResponse {
            return None;
        }
        self.last_question().and_then(|q| q.options.as_deref())
    }

    fn last_question(&self) -> Option<&ConversationStep> {
        self.conversation_log
            .iter()
            .rev()
            .find(|s| s.step_type == StepType::Question)
    }

    fn set_state(&mut self, next: ResolverState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(MemoryBankError::InvalidTransition {
                from: self.state.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    fn push_step(
        &mut self,
        step_type: StepType,
        content: impl Into<String>,
        options: Option<Vec<String>>,
        user_response: Option<String>,
    ) {
        let step = self.conversation_log.len() as u32 + 1;
        self.conversation_log.push(ConversationStep {
            step,
            step_type,
            content: content.into(),
            options,
            user_response,
            timestamp: now_secs(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveResolutionResult {
    pub resolved: bool,
    pub actions_performed: Vec<ConflictAction>,
    pub user_choices: Vec<UserChoice>,
    /// `None` when the bank could not be re-read after the last action
    pub final_state: Option<SyncSnapshot>,
    pub conversation_log: Vec<ConversationStep>,
}

/// Walks a user through planned actions one at a time.
///
/// Actions that need no confirmation are applied as soon as they come up;
/// the rest are asked as questions and wait for [`respond`](Self::respond).
pub struct InteractiveResolver<'a> {
    fs: &'a dyn BankFs,
    config: &'a BankConfig,
    project_root: &'a Path,
}

impl<'a> InteractiveResolver<'a> {
    pub fn new(fs: &'a dyn BankFs, config: &'a BankConfig, project_root: &'a Path) -> Self {
        Self {
            fs,
            config,
            project_root,
        }
    }

    pub fn start(&self, actions: Vec<ConflictAction>) -> Result<ResolutionSession> {
        let mut session = ResolutionSession::new(actions);
        session.set_state(ResolverState::Presenting)?;

        let confirmations = session.actions.iter().filter(|a| a.requires_confirmation).count();
        session.push_step(
            StepType::Information,
            format!(
                "{} corrective actions proposed, {} need confirmation",
                session.actions.len(),
                confirmations
            ),
            None,
            None,
        );

        tracing::info!("Started resolution session {}", session.id);
        self.advance(&mut session)?;
        Ok(session)
    }

    /// Answer the open question with one of its options (or its 1-based
    /// number). `yes`/`y` accept the proposed action and `no`/`n` skip it.
    pub fn respond(&self, session: &mut ResolutionSession, answer: &str) -> Result<()> {
        if session.state != ResolverState::AwaitingResponse {
            return Err(MemoryBankError::InvalidTransition {
                from: session.state.as_str().to_string(),
                to: ResolverState::Applying.as_str().to_string(),
            });
        }

        let action = session.current_action().cloned().ok_or_else(|| {
            MemoryBankError::InvalidTransition {
                from: session.state.as_str().to_string(),
                to: ResolverState::Applying.as_str().to_string(),
            }
        })?;
        let options = self.options_for(&action);
        let question = session
            .last_question()
            .map(|q| q.content.clone())
            .unwrap_or_default();

        let Some(selection) = interpret_answer(answer, &options) else {
            session.push_step(
                StepType::Warning,
                format!("Unrecognised answer '{}', expected one of: {}", answer.trim(), options.join(", ")),
                Some(options),
                Some(answer.to_string()),
            );
            return Ok(());
        };

        let selected_action = self.selected_action(&action, &selection);
        let summary = match &selected_action {
            Some(selected) => format!("Selected {} for {}", selected.action_type.as_str(), selected.target_file),
            None => format!("Skipped {} for {}", action.action_type.as_str(), action.target_file),
        };
        session.push_step(StepType::Confirmation, summary, None, Some(answer.to_string()));
        session.user_choices.push(UserChoice {
            question,
            answer: answer.to_string(),
            selected_action: selected_action.clone(),
        });

        session.set_state(ResolverState::Applying)?;
        if let Some(selected) = selected_action {
            self.apply(session, selected);
        }
        session.cursor += 1;
        session.set_state(ResolverState::Presenting)?;

        self.advance(session)
    }

    /// Cancel from any non-terminal state. Applied actions stay applied.
    pub fn abort(&self, session: &mut ResolutionSession, reason: Option<&str>) -> Result<()> {
        session.set_state(ResolverState::Aborted)?;

        let content = match reason {
            Some(reason) => format!("Resolution aborted: {}", reason),
            None => "Resolution aborted".to_string(),
        };
        session.push_step(StepType::Warning, content, None, None);

        session.final_state = self.recheck(session);

        tracing::info!(
            "Aborted resolution session {} after {} actions",
            session.id,
            session.actions_performed.len()
        );
        Ok(())
    }

    /// The final report; only available once the session is terminal.
    pub fn finish(&self, session: &ResolutionSession) -> Result<InteractiveResolutionResult> {
        if !session.state.is_terminal() {
            return Err(MemoryBankError::InvalidTransition {
                from: session.state.as_str().to_string(),
                to: ResolverState::Completed.as_str().to_string(),
            });
        }

        let final_state = match &session.final_state {
            Some(snapshot) => Some(snapshot.clone()),
            None => self.recheck(session),
        };
        let resolved = session.state == ResolverState::Completed
            && final_state.as_ref().is_some_and(|snapshot| snapshot.conflict.is_none());

        Ok(InteractiveResolutionResult {
            resolved,
            actions_performed: session.actions_performed.clone(),
            user_choices: session.user_choices.clone(),
            final_state,
            conversation_log: session.conversation_log.clone(),
        })
    }

    /// Apply actions until one needs confirmation or the list runs out.
    fn advance(&self, session: &mut ResolutionSession) -> Result<()> {
        while let Some(action) = session.current_action().cloned() {
            if action.requires_confirmation {
                let options = self.options_for(&action);
                session.push_step(StepType::Question, question_for(&action), Some(options), None);
                return session.set_state(ResolverState::AwaitingResponse);
            }

            self.apply(session, action);
            session.cursor += 1;
        }

        self.complete(session)
    }

    /// Always ends in `Completed`; a failed recheck is logged as a warning step.
    fn complete(&self, session: &mut ResolutionSession) -> Result<()> {
        let applied = session.actions_performed.len();
        let content = match SyncReconciler::new(self.config).check(self.fs, self.project_root) {
            Ok(snapshot) => {
                let content = match &snapshot.conflict {
                    None => format!("Resolution complete: {} actions applied, memory bank in sync", applied),
                    Some(conflict) => format!(
                        "Resolution complete: {} actions applied, {} conflict remains ({} files)",
                        applied,
                        conflict.kind.as_str(),
                        conflict.all_files().count()
                    ),
                };
                session.final_state = Some(snapshot);
                content
            }
            Err(e) => {
                tracing::warn!("Cannot recompute sync state for session {}: {}", session.id, e);
                session.push_step(
                    StepType::Warning,
                    format!("Cannot recompute sync state: {}", e),
                    None,
                    None,
                );
                format!("Resolution complete: {} actions applied, sync state unknown", applied)
            }
        };
        session.push_step(StepType::Result, content, None, None);
        session.set_state(ResolverState::Completed)?;

        tracing::info!("Completed resolution session {}", session.id);
        Ok(())
    }

    fn recheck(&self, session: &ResolutionSession) -> Option<SyncSnapshot> {
        match SyncReconciler::new(self.config).check(self.fs, self.project_root) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Cannot recompute sync state for session {}: {}", session.id, e);
                None
            }
        }
    }

    fn apply(&self, session: &mut ResolutionSession, action: ConflictAction) {
        let applier = ActionApplier::new(self.fs, self.config, self.project_root);
        match applier.apply(&action) {
            Ok(()) => {
                session.push_step(
                    StepType::Information,
                    format!("Applied {} to {}", action.action_type.as_str(), action.target_file),
                    None,
                    None,
                );
                session.actions_performed.push(action);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to apply {} to {}: {}",
                    action.action_type.as_str(),
                    action.target_file,
                    e
                );
                session.push_step(
                    StepType::Warning,
                    format!(
                        "Failed to apply {} to {}: {}",
                        action.action_type.as_str(),
                        action.target_file,
                        e
                    ),
                    None,
                    None,
                );
            }
        }
    }

    fn options_for(&self, action: &ConflictAction) -> Vec<String> {
        let mut options = vec![action.action_type.as_str().to_string(), SKIP_OPTION.to_string()];
        if action.action_type == ActionType::AddReference && !self.config.is_core(&action.target_file) {
            options.push(ActionType::DeleteFile.as_str().to_string());
        }
        options
    }

    fn selected_action(&self, proposed: &ConflictAction, selection: &str) -> Option<ConflictAction> {
        if selection == SKIP_OPTION {
            return None;
        }

        match ActionType::parse(selection) {
            Some(action_type) if action_type == proposed.action_type => Some(proposed.clone()),
            Some(action_type) => Some(ConflictAction::new(
                action_type,
                proposed.target_file.clone(),
                proposed.impact,
                format!(
                    "{} {}{} instead of {}",
                    action_type.as_str(),
                    self.config.docs_prefix(),
                    proposed.target_file,
                    proposed.action_type.as_str()
                ),
            )),
            None => None,
        }
    }
}

fn question_for(action: &ConflictAction) -> String {
    let destructive = if action.action_type.is_destructive() {
        " This cannot be undone."
    } else {
        ""
    };
    format!(
        "{} ({} impact). Apply {}?{}",
        action.description,
        action.impact.as_str(),
        action.action_type.as_str(),
        destructive
    )
}

/// Map a raw answer onto one of `options`.
fn interpret_answer(answer: &str, options: &[String]) -> Option<String> {
    let normalized = answer.trim().to_lowercase();

    if let Ok(number) = normalized.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .cloned();
    }

    match normalized.as_str() {
        "y" | "yes" | "apply" => options.first().cloned(),
        "n" | "no" => Some(SKIP_OPTION.to_string()),
        other => options.iter().find(|o| o.as_str() == other).cloned(),
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fs::{FsEntry, StdFs};
    use crate::memory::sync::Severity;
    use std::fs;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Denies directory listings once anything has been written.
    struct LockedAfterWrite {
        written: AtomicBool,
    }

    impl BankFs for LockedAfterWrite {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            StdFs.read_to_string(path)
        }

        fn write(&self, path: &Path, content: &str) -> io::Result<()> {
            self.written.store(true, Ordering::SeqCst);
            StdFs.write(path, content)
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            StdFs.remove_file(path)
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            StdFs.create_dir_all(path)
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
            if self.written.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"));
            }
            StdFs.read_dir(path)
        }

        fn is_file(&self, path: &Path) -> bool {
            StdFs.is_file(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            StdFs.is_dir(path)
        }
    }

    fn write_core(root: &Path, config: &BankConfig) {
        let bank = config.docs_root(root);
        fs::create_dir_all(&bank).unwrap();
        for core in &config.core_files {
            fs::write(bank.join(core), "# Core\n").unwrap();
        }
    }

    fn add(target: &str, impact: Severity) -> ConflictAction {
        ConflictAction::new(ActionType::AddReference, target, impact, format!("Add {}", target))
    }

    fn assert_numbering(session: &ResolutionSession) {
        for (i, step) in session.conversation_log.iter().enumerate() {
            assert_eq!(step.step as usize, i + 1);
        }
    }

    #[test]
    fn test_transition_table() {
        use ResolverState::*;
        assert!(Idle.can_transition_to(Presenting));
        assert!(AwaitingResponse.can_transition_to(Applying));
        assert!(Applying.can_transition_to(Aborted));
        assert!(!Idle.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Aborted));
        assert!(!Aborted.can_transition_to(Presenting));
    }

    #[test]
    fn test_interpret_answer() {
        let options = vec!["add-reference".to_string(), "skip".to_string(), "delete-file".to_string()];
        assert_eq!(interpret_answer(" YES ", &options).as_deref(), Some("add-reference"));
        assert_eq!(interpret_answer("n", &options).as_deref(), Some("skip"));
        assert_eq!(interpret_answer("3", &options).as_deref(), Some("delete-file"));
        assert_eq!(interpret_answer("0", &options), None);
        assert_eq!(interpret_answer("maybe", &options), None);
    }

    #[test]
    fn test_auto_apply_completes_without_questions() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();
        write_core(temp_dir.path(), &config);
        fs::write(config.docs_root(temp_dir.path()).join("extra.md"), "# Extra\n").unwrap();

        let mut actions: Vec<_> = config.core_files.iter().map(|c| add(c, Severity::Low)).collect();
        actions.push(add("extra.md", Severity::Low));

        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let session = resolver.start(actions).unwrap();

        assert_eq!(session.state, ResolverState::Completed);
        assert_eq!(session.actions_performed.len(), 7);
        assert_numbering(&session);

        let result = resolver.finish(&session).unwrap();
        assert!(result.resolved);
        assert!(result.final_state.unwrap().report.is_in_sync);
        assert_eq!(result.conversation_log.last().unwrap().step_type, StepType::Result);
    }

    #[test]
    fn test_question_then_respond() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();
        write_core(temp_dir.path(), &config);

        let actions = vec![add("activeContext.md", Severity::High), add("progress.md", Severity::Low)];
        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let mut session = resolver.start(actions).unwrap();

        assert_eq!(session.state, ResolverState::AwaitingResponse);
        assert_eq!(
            session.pending_options().unwrap(),
            &["add-reference".to_string(), "skip".to_string()]
        );
        assert!(resolver.finish(&session).is_err());

        resolver.respond(&mut session, "yes").unwrap();
        assert_eq!(session.state, ResolverState::Completed);
        assert_eq!(session.actions_performed.len(), 2);
        assert_eq!(session.user_choices.len(), 1);
        assert_eq!(
            session.user_choices[0].selected_action.as_ref().map(|a| a.action_type),
            Some(ActionType::AddReference)
        );
        assert_numbering(&session);
    }

    #[test]
    fn test_skip_records_choice_without_action() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();

        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let mut session = resolver.start(vec![add("projectbrief.md", Severity::High)]).unwrap();
        resolver.respond(&mut session, "skip").unwrap();

        assert_eq!(session.state, ResolverState::Completed);
        assert!(session.actions_performed.is_empty());
        assert!(session.user_choices[0].selected_action.is_none());
        assert!(!resolver.finish(&session).unwrap().resolved);
    }

    #[test]
    fn test_alternative_delete_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();
        let bank = config.docs_root(temp_dir.path());
        fs::create_dir_all(&bank).unwrap();
        fs::write(bank.join("scratch.md"), "notes").unwrap();

        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let mut session = resolver.start(vec![add("scratch.md", Severity::High)]).unwrap();
        assert_eq!(session.pending_options().unwrap().len(), 3);

        resolver.respond(&mut session, "delete-file").unwrap();
        assert!(!bank.join("scratch.md").exists());
        assert_eq!(session.actions_performed[0].action_type, ActionType::DeleteFile);
    }

    #[test]
    fn test_unrecognised_answer_keeps_waiting() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();

        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let mut session = resolver.start(vec![add("projectbrief.md", Severity::High)]).unwrap();
        let steps = session.conversation_log.len();

        resolver.respond(&mut session, "perhaps").unwrap();
        assert_eq!(session.state, ResolverState::AwaitingResponse);
        assert_eq!(session.conversation_log.len(), steps + 1);
        assert_eq!(session.conversation_log.last().unwrap().step_type, StepType::Warning);
        assert!(session.user_choices.is_empty());
    }

    #[test]
    fn test_abort_keeps_log_and_applied_actions() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();
        write_core(temp_dir.path(), &config);

        let actions = vec![
            add("activeContext.md", Severity::Low),
            ConflictAction::new(ActionType::DeleteFile, "progress.md", Severity::Low, "Delete progress"),
        ];
        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let mut session = resolver.start(actions).unwrap();
        assert_eq!(session.state, ResolverState::AwaitingResponse);

        let steps_before = session.conversation_log.len();
        resolver.abort(&mut session, Some("user cancelled")).unwrap();

        assert_eq!(session.state, ResolverState::Aborted);
        assert_eq!(session.conversation_log.len(), steps_before + 1);
        assert_eq!(session.actions_performed.len(), 1);
        assert!(config.docs_root(temp_dir.path()).join("progress.md").exists());
        assert_numbering(&session);

        let result = resolver.finish(&session).unwrap();
        assert!(!result.resolved);

        assert!(matches!(
            resolver.abort(&mut session, None),
            Err(MemoryBankError::InvalidTransition { .. })
        ));
        assert!(resolver.respond(&mut session, "yes").is_err());
    }

    #[test]
    fn test_failed_apply_is_warning() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();

        let actions = vec![ConflictAction::new(
            ActionType::CreateFile,
            "../escape.md",
            Severity::Low,
            "bad target",
        )];
        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let session = resolver.start(actions).unwrap();

        assert_eq!(session.state, ResolverState::Completed);
        assert!(session.actions_performed.is_empty());
        assert!(session
            .conversation_log
            .iter()
            .any(|s| s.step_type == StepType::Warning));
    }

    #[test]
    fn test_session_round_trips_as_json() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();

        let resolver = InteractiveResolver::new(&StdFs, &config, temp_dir.path());
        let session = resolver.start(vec![add("projectbrief.md", Severity::High)]).unwrap();

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"state\":\"awaiting-response\""));
        let mut restored: ResolutionSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);

        resolver.respond(&mut restored, "1").unwrap();
        assert_eq!(restored.state, ResolverState::Completed);
    }

    #[test]
    fn test_unreadable_bank_after_last_answer_still_completes() {
        let temp_dir = TempDir::new().unwrap();
        let config = BankConfig::default();
        write_core(temp_dir.path(), &config);

        let locked = LockedAfterWrite {
            written: AtomicBool::new(false),
        };
        let resolver = InteractiveResolver::new(&locked, &config, temp_dir.path());
        let mut session = resolver.start(vec![add("projectbrief.md", Severity::High)]).unwrap();
        assert_eq!(session.state, ResolverState::AwaitingResponse);

        resolver.respond(&mut session, "yes").unwrap();

        assert_eq!(session.state, ResolverState::Completed);
        assert_eq!(session.actions_performed.len(), 1);
        assert!(session.final_state.is_none());
        assert!(session
            .conversation_log
            .iter()
            .any(|s| s.step_type == StepType::Warning && s.content.starts_with("Cannot recompute")));
        assert_eq!(session.conversation_log.last().unwrap().step_type, StepType::Result);
        assert_numbering(&session);

        let result = resolver.finish(&session).unwrap();
        assert!(!result.resolved);
        assert!(result.final_state.is_none());
        assert!(resolver.respond(&mut session, "yes").is_err());
    }
}
