//! Aggregates structure, patterns and complexity into documentation
//! recommendations.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::patterns::{ComplexitySummary, PatternDetector, PatternMatch};
use crate::analysis::structure::{DirectoryKind, ProjectStructureFact, ProjectStructureScanner};
use crate::config::BankConfig;
use crate::error::Result;

/// Extra documents suggested when a pattern is present
const PATTERN_DOCUMENTS: &[(&str, &str)] = &[
    ("Express.js API", "api/endpoints.md"),
    ("MCP Server", "api/tools.md"),
    ("React Components", "features/components.md"),
    ("Vue Components", "features/components.md"),
    ("Next.js Application", "features/routing.md"),
    ("Class-based OOP", "architecture/classes.md"),
    ("Test Suite", "testing/strategy.md"),
];

const FOCUS_COMPLEXITY_THRESHOLD: u32 = 10;
const FOCUS_FILE_LIMIT: usize = 5;
const LARGE_DEPENDENCY_COUNT: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub suggested_files: Vec<String>,
    pub focus_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub structure: ProjectStructureFact,
    pub patterns: Vec<PatternMatch>,
    pub complexity: ComplexitySummary,
    pub recommendations: Recommendations,
}

pub struct ProjectAnalyzer {
    scanner: ProjectStructureScanner,
    core_files: Vec<String>,
}

impl ProjectAnalyzer {
    pub fn new(config: &BankConfig) -> Self {
        Self {
            scanner: ProjectStructureScanner::new(config),
            core_files: config.core_files.clone(),
        }
    }

    pub fn analyze(&self, root: &Path) -> Result<AnalysisResult> {
        let (structure, sources) = self.scanner.scan_with_sources(root)?;

        let patterns = PatternDetector::detect(
            structure
                .files
                .iter()
                .zip(sources.iter().map(String::as_str)),
        );
        let complexity = PatternDetector::complexity_summary(&structure.files);
        let recommendations = self.recommend(&structure, &patterns, &complexity);

        tracing::info!(
            "Analysis found {} patterns, max complexity {}",
            patterns.len(),
            complexity.max
        );

        Ok(AnalysisResult {
            structure,
            patterns,
            complexity,
            recommendations,
        })
    }

    pub fn recommend(
        &self,
        structure: &ProjectStructureFact,
        patterns: &[PatternMatch],
        complexity: &ComplexitySummary,
    ) -> Recommendations {
        let mut suggested_files = self.core_files.clone();
        let extras: BTreeSet<&str> = PATTERN_DOCUMENTS
            .iter()
            .filter(|(pattern, _)| patterns.iter().any(|m| m.pattern_name == *pattern))
            .map(|(_, document)| *document)
            .collect();
        suggested_files.extend(extras.into_iter().map(String::from));

        let mut focus_areas = Vec::new();

        let mut complex: Vec<(&String, &u32)> = complexity
            .per_file
            .iter()
            .filter(|(_, score)| **score > FOCUS_COMPLEXITY_THRESHOLD)
            .collect();
        complex.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (path, score) in complex.into_iter().take(FOCUS_FILE_LIMIT) {
            focus_areas.push(format!("Refactor candidate: {} (complexity {})", path, score));
        }

        for failed in structure.files.iter().filter(|f| !f.parse_succeeded) {
            focus_areas.push(format!("Parse failure: {}", failed.file_path));
        }

        if structure.dependencies.len() > LARGE_DEPENDENCY_COUNT {
            focus_areas.push(format!(
                "Large dependency surface: {} declared dependencies",
                structure.dependencies.len()
            ));
        }

        let has_tests = structure.directories_of(DirectoryKind::Test).next().is_some()
            || patterns.iter().any(|m| m.pattern_name == "Test Suite");
        if !structure.files.is_empty() && !has_tests {
            focus_areas.push("No tests detected".to_string());
        }

        Recommendations {
            suggested_files,
            focus_areas,
        }
    }
}
