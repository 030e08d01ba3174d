//! Project tree walk: directory classification, size metrics, dependency
//! enumeration and per-file source facts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::extractor::SourceFactExtractor;
use crate::analysis::facts::SourceFact;
use crate::config::BankConfig;
use crate::dependencies::{Dependency, DependencyRegistry};
use crate::error::{MemoryBankError, Result};

/// Hidden directories that still carry project configuration
const VISIBLE_HIDDEN_DIRS: &[&str] = &[".github", ".vscode"];

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "specs", "e2e"];
const DOC_DIRS: &[&str] = &["doc", "docs", "documentation", "wiki"];
const SOURCE_DIRS: &[&str] = &["src", "lib", "app", "source", "pkg", "components", "server", "client"];
const CONFIG_DIRS: &[&str] = &["config", "configs", "conf", "settings", ".github", ".vscode"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    Test,
    Documentation,
    Source,
    Configuration,
}

impl DirectoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryKind::Test => "test",
            DirectoryKind::Documentation => "documentation",
            DirectoryKind::Source => "source",
            DirectoryKind::Configuration => "configuration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedDirectory {
    pub path: String,
    pub kind: DirectoryKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeMetrics {
    /// Non-blank lines across recognised source files
    pub lines_of_code: usize,
    pub file_count: usize,
    pub directory_count: usize,
    pub symlink_count: usize,
    /// Language name -> number of source files
    pub languages: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStructureFact {
    pub root: String,
    /// Facts for every parseable source file, sorted by path
    pub files: Vec<SourceFact>,
    pub directories: Vec<ClassifiedDirectory>,
    pub dependencies: Vec<Dependency>,
    pub metrics: SizeMetrics,
}

impl ProjectStructureFact {
    pub fn empty(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
            directories: Vec::new(),
            dependencies: Vec::new(),
            metrics: SizeMetrics::default(),
        }
    }

    pub fn directories_of(&self, kind: DirectoryKind) -> impl Iterator<Item = &ClassifiedDirectory> {
        self.directories.iter().filter(move |d| d.kind == kind)
    }
}

/// Classify a directory by its lowercased path components.
///
/// Priority is test > documentation > source > configuration, so
/// `docs/test-plans` is a test directory. Unmatched directories yield `None`.
pub fn classify_directory(relative_path: &str, docs_dir: &str) -> Option<DirectoryKind> {
    let lowered = relative_path.to_lowercase();
    let components: Vec<&str> = lowered.split('/').filter(|c| !c.is_empty()).collect();
    let docs_dir = docs_dir.trim_end_matches('/').to_lowercase();

    let is_test = |c: &&str| TEST_DIRS.contains(c) || c.starts_with("test");
    let in_docs_dir = lowered == docs_dir || lowered.starts_with(&format!("{}/", docs_dir));

    if components.iter().any(is_test) {
        Some(DirectoryKind::Test)
    } else if in_docs_dir || components.iter().any(|c| DOC_DIRS.contains(c)) {
        Some(DirectoryKind::Documentation)
    } else if components.iter().any(|c| SOURCE_DIRS.contains(c)) {
        Some(DirectoryKind::Source)
    } else if components.iter().any(|c| CONFIG_DIRS.contains(c)) {
        Some(DirectoryKind::Configuration)
    } else {
        None
    }
}

/// Language of a recognised source file, by extension.
pub fn source_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let language = match ext.as_str() {
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "tsx",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "rs" => "rust",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "swift" => "swift",
        "vue" => "vue",
        "svelte" => "svelte",
        _ => return None,
    };
    Some(language)
}

pub struct ProjectStructureScanner {
    extractor: SourceFactExtractor,
    dependencies: DependencyRegistry,
    docs_dir: String,
    ignored_dirs: Vec<String>,
}

struct SourceEntry {
    path: PathBuf,
    relative: String,
    language: &'static str,
}

impl ProjectStructureScanner {
    pub fn new(config: &BankConfig) -> Self {
        Self {
            extractor: SourceFactExtractor::new(),
            dependencies: DependencyRegistry::with_defaults(),
            docs_dir: config.docs_dir.clone(),
            ignored_dirs: config.ignored_dirs.clone(),
        }
    }

    pub fn scan(&self, root: &Path) -> Result<ProjectStructureFact> {
        self.scan_with_sources(root).map(|(structure, _)| structure)
    }

    /// Like [`scan`](Self::scan), also returning the text of every file in
    /// `structure.files`, index-aligned.
    pub fn scan_with_sources(&self, root: &Path) -> Result<(ProjectStructureFact, Vec<String>)> {
        let root_label = root.display().to_string();

        if let Err(e) = std::fs::read_dir(root) {
            return match e.kind() {
                std::io::ErrorKind::PermissionDenied => Err(MemoryBankError::from_io(e, root)),
                _ => {
                    tracing::debug!("Project root {} not readable as a directory: {}", root_label, e);
                    Ok((ProjectStructureFact::empty(root_label), Vec::new()))
                }
            };
        }

        let mut metrics = SizeMetrics::default();
        let mut directories = Vec::new();
        let mut sources = Vec::new();

        for entry in self.walker(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let relative = relative_path(root, entry.path());

            // Leaf with no content; never followed
            if entry.path_is_symlink() {
                metrics.symlink_count += 1;
                continue;
            }

            let Some(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                metrics.directory_count += 1;
                if let Some(kind) = classify_directory(&relative, &self.docs_dir) {
                    directories.push(ClassifiedDirectory { path: relative, kind });
                }
            } else if file_type.is_file() {
                metrics.file_count += 1;
                if let Some(language) = source_language(entry.path()) {
                    *metrics.languages.entry(language.to_string()).or_default() += 1;
                    sources.push(SourceEntry {
                        path: entry.into_path(),
                        relative,
                        language,
                    });
                }
            }
        }

        directories.sort_by(|a, b| a.path.cmp(&b.path));
        sources.sort_by(|a, b| a.relative.cmp(&b.relative));

        let scanned: Vec<(Option<(SourceFact, String)>, usize)> =
            sources.par_iter().map(|source| self.scan_file(source)).collect();

        metrics.lines_of_code = scanned.iter().map(|(_, loc)| loc).sum();
        let (files, texts): (Vec<SourceFact>, Vec<String>) =
            scanned.into_iter().filter_map(|(parsed, _)| parsed).unzip();

        let dependencies = self.dependencies.collect(root);

        tracing::info!(
            "Scanned {}: {} files, {} directories, {} parsed sources",
            root_label,
            metrics.file_count,
            metrics.directory_count,
            files.len()
        );

        Ok((
            ProjectStructureFact {
                root: root_label,
                files,
                directories,
                dependencies,
                metrics,
            },
            texts,
        ))
    }

    fn walker(&self, root: &Path) -> ignore::Walk {
        let ignored = self.ignored_dirs.clone();

        WalkBuilder::new(root)
            .hidden(false)
            .follow_links(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if name.starts_with('.') && !VISIBLE_HIDDEN_DIRS.contains(&name.as_ref()) {
                    return false;
                }
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !(is_dir && ignored.iter().any(|d| d == name.as_ref()))
            })
            .build()
    }

    /// Parsed fact plus text for parseable files, and the non-blank line count.
    fn scan_file(&self, source: &SourceEntry) -> (Option<(SourceFact, String)>, usize) {
        let parseable = self.extractor.is_supported(&source.path);

        let content = match std::fs::read_to_string(&source.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", source.path.display(), e);
                let failed = parseable.then(|| {
                    let fact = SourceFact::failed(
                        source.relative.clone(),
                        source.language,
                        format!("Cannot read file: {}", e),
                    );
                    (fact, String::new())
                });
                return (failed, 0);
            }
        };

        let loc = content.lines().filter(|l| !l.trim().is_empty()).count();
        if !parseable {
            return (None, loc);
        }

        let fact = self.extractor.extract(&source.relative, &content);
        if !fact.parse_succeeded {
            tracing::warn!(
                "Parse failure in {}: {}",
                source.relative,
                fact.parse_error.as_deref().unwrap_or("unknown error")
            );
        }
        (Some((fact, content)), loc)
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
