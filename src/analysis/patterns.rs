//! Catalogue-driven pattern detection and file-level complexity.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::analysis::facts::SourceFact;

/// One entry of the pattern catalogue
pub struct PatternRule {
    pub name: &'static str,
    pub description: &'static str,
    detect: fn(&SourceFact, &str) -> bool,
}

impl PatternRule {
    pub fn matches(&self, fact: &SourceFact, text: &str) -> bool {
        (self.detect)(fact, text)
    }
}

pub static CATALOGUE: &[PatternRule] = &[
    PatternRule {
        name: "Express.js API",
        description: "HTTP routes served through express",
        detect: |fact, _| fact.imports_module("express"),
    },
    PatternRule {
        name: "React Components",
        description: "UI built from React components",
        detect: |fact, _| fact.imports_module("react") || fact.imports_module_prefix("react-dom"),
    },
    PatternRule {
        name: "Next.js Application",
        description: "Pages and routes managed by Next.js",
        detect: |fact, _| fact.imports_module("next") || fact.imports_module_prefix("next/"),
    },
    PatternRule {
        name: "Vue Components",
        description: "UI built from Vue components",
        detect: |fact, _| fact.imports_module("vue"),
    },
    PatternRule {
        name: "MCP Server",
        description: "Model Context Protocol server exposing tools",
        detect: |fact, _| fact.imports_module_prefix("@modelcontextprotocol/sdk"),
    },
    PatternRule {
        name: "Async/Await",
        description: "Asynchronous flow written with async functions awaiting promises",
        detect: |fact, text| fact.all_functions().any(|f| f.is_async) && text.contains("await "),
    },
    PatternRule {
        name: "Promise Chains",
        description: "Asynchronous flow composed with then/catch chains",
        detect: |_, text| text.contains(".then(") && (text.contains(".catch(") || text.contains(".finally(")),
    },
    PatternRule {
        name: "Class-based OOP",
        description: "Behaviour organised in classes",
        detect: |fact, _| !fact.classes.is_empty(),
    },
    PatternRule {
        name: "ES Modules",
        description: "import/export module syntax",
        detect: |fact, text| {
            fact.imports.iter().any(|i| !i.module_path.is_empty())
                && (text.contains("import ") || text.contains("export "))
        },
    },
    PatternRule {
        name: "CommonJS Modules",
        description: "require/module.exports module syntax",
        detect: |_, text| text.contains("require(") || text.contains("module.exports"),
    },
    PatternRule {
        name: "Functional Pipelines",
        description: "Collection transforms with map/filter/reduce",
        detect: |_, text| {
            let transforms = [".map(", ".filter(", ".reduce("];
            transforms.iter().filter(|t| text.contains(*t)).count() >= 2
        },
    },
    PatternRule {
        name: "Test Suite",
        description: "describe/it style test files",
        detect: |_, text| text.contains("describe(") && (text.contains("it(") || text.contains("test(")),
    },
    PatternRule {
        name: "Error Handling",
        description: "Explicit try/catch error handling",
        detect: |_, text| text.contains("try {") && text.contains("catch"),
    },
    PatternRule {
        name: "Singleton",
        description: "Single shared instance exposed through getInstance",
        detect: |fact, _| {
            fact.classes
                .iter()
                .any(|c| c.methods.iter().any(|m| m.name == "getInstance"))
        },
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub pattern_name: String,
    pub evidence_locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

impl ComplexityLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=5 => ComplexityLevel::Low,
            6..=10 => ComplexityLevel::Medium,
            _ => ComplexityLevel::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexitySummary {
    /// Highest file complexity in the project
    pub max: u32,
    /// Mean of file complexities over successfully parsed files
    pub average: f64,
    pub level: ComplexityLevel,
    /// File path -> file complexity
    pub per_file: BTreeMap<String, u32>,
}

pub struct PatternDetector;

impl PatternDetector {
    /// Run every catalogue rule over the given files. Matches collapse by
    /// pattern name; evidence is the sorted set of matching file paths.
    pub fn detect<'a, I>(files: I) -> Vec<PatternMatch>
    where
        I: IntoIterator<Item = (&'a SourceFact, &'a str)>,
    {
        let mut matches: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();

        for (fact, text) in files {
            for rule in CATALOGUE {
                if rule.matches(fact, text) {
                    matches
                        .entry(rule.name)
                        .or_default()
                        .insert(fact.file_path.clone());
                }
            }
        }

        matches
            .into_iter()
            .map(|(name, locations)| PatternMatch {
                pattern_name: name.to_string(),
                evidence_locations: locations.into_iter().collect(),
            })
            .collect()
    }

    /// Fact-only detection, for callers that no longer hold the file text.
    pub fn detect_facts(facts: &[SourceFact]) -> Vec<PatternMatch> {
        Self::detect(facts.iter().map(|f| (f, "")))
    }

    /// A file is as complex as its worst function; a file without functions
    /// scores 1.
    pub fn file_complexity(fact: &SourceFact) -> u32 {
        fact.all_functions().map(|f| f.complexity).max().unwrap_or(1)
    }

    pub fn complexity_summary(facts: &[SourceFact]) -> ComplexitySummary {
        let per_file: BTreeMap<String, u32> = facts
            .iter()
            .filter(|f| f.parse_succeeded)
            .map(|f| (f.file_path.clone(), Self::file_complexity(f)))
            .collect();

        let max = per_file.values().copied().max().unwrap_or(0);
        let average = if per_file.is_empty() {
            0.0
        } else {
            per_file.values().map(|&c| c as f64).sum::<f64>() / per_file.len() as f64
        };

        ComplexitySummary {
            max,
            average,
            level: ComplexityLevel::from_score(max),
            per_file,
        }
    }
}
