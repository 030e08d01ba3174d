//! Source analysis: per-file facts, pattern catalogue, project structure and
//! recommendations.

pub mod complexity;
pub mod extractor;
pub mod facts;
pub mod parser;
pub mod patterns;
pub mod recommend;
pub mod structure;

pub use extractor::SourceFactExtractor;
pub use facts::{ClassFact, FunctionFact, ImportFact, ImportKind, ParameterFact, SourceFact};
pub use patterns::{ComplexityLevel, ComplexitySummary, PatternDetector, PatternMatch, CATALOGUE};
pub use recommend::{AnalysisResult, ProjectAnalyzer, Recommendations};
pub use structure::{
    classify_directory, ClassifiedDirectory, DirectoryKind, ProjectStructureFact,
    ProjectStructureScanner, SizeMetrics,
};
