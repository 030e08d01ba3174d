pub mod analysis;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod languages;
pub mod memory;

pub use analysis::{AnalysisResult, ProjectAnalyzer, ProjectStructureScanner, SourceFactExtractor};
pub use config::BankConfig;
pub use dependencies::{
    CargoResolver, Dependency, DependencyRegistry, DependencyResolver, Ecosystem, NpmResolver,
    ProjectInfo,
};
pub use error::{MemoryBankError, Result};
pub use languages::LanguageRegistry;
pub use memory::{
    ConflictPlanner, InteractiveResolver, MemoryBankValidator, StdFs, SyncReconciler,
};
