//! Memory bank reconciliation: discovery, index cross-referencing, planning
//! and interactive resolution.

pub mod apply;
pub mod discovery;
pub mod fs;
pub mod planner;
pub mod resolver;
pub mod sync;
pub mod validate;

pub use apply::ActionApplier;
pub use discovery::MemoryBankDiscoverer;
pub use fs::{BankFs, FsEntry, StdFs};
pub use planner::{ConflictAction, ConflictPlanner};
pub use resolver::{
    ConversationStep, InteractiveResolutionResult, InteractiveResolver, ResolutionSession,
    ResolverState, StepType, UserChoice,
};
pub use sync::{
    ActionType, ConflictKind, FileConflictInfo, Severity, SyncConflict, SyncReconciler,
    SyncReport, SyncSnapshot,
};
pub use validate::{BankStructure, MemoryBankValidator, Organization, ValidationReport};
