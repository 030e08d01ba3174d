//! Dependency resolver trait and registry.

use std::path::Path;

use crate::error::Result;

use super::{Dependency, Ecosystem, ProjectInfo};

/// Trait for reading the manifest of a specific ecosystem.
pub trait DependencyResolver: Send + Sync {
    /// Returns the ecosystem this resolver handles.
    fn ecosystem(&self) -> Ecosystem;

    /// Returns the manifest file names this resolver can parse.
    fn manifest_names(&self) -> &[&str];

    /// Parses manifest content read from `path`.
    fn parse_manifest(&self, content: &str, path: &Path) -> Result<ProjectInfo>;
}

/// Registry for dependency resolvers.
pub struct DependencyRegistry {
    resolvers: Vec<Box<dyn DependencyResolver>>,
}

impl DependencyRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Creates a registry with all built-in resolvers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(super::npm::NpmResolver::new()));
        registry.register(Box::new(super::cargo::CargoResolver::new()));
        registry
    }

    pub fn register(&mut self, resolver: Box<dyn DependencyResolver>) {
        self.resolvers.push(resolver);
    }

    /// Reads every manifest present at the project root.
    ///
    /// Missing manifests are skipped silently, malformed ones with a warning.
    pub fn projects(&self, root: &Path) -> Vec<ProjectInfo> {
        let mut projects = Vec::new();

        for resolver in &self.resolvers {
            for manifest_name in resolver.manifest_names() {
                let manifest = root.join(manifest_name);
                let content = match std::fs::read_to_string(&manifest) {
                    Ok(content) => content,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => {
                        tracing::warn!("Cannot read {}: {}", manifest.display(), e);
                        continue;
                    }
                };

                match resolver.parse_manifest(&content, &manifest) {
                    Ok(project) => {
                        tracing::debug!(
                            "Read {} manifest {}: {} dependencies",
                            resolver.ecosystem().as_str(),
                            manifest.display(),
                            project.dependencies.len()
                        );
                        projects.push(project);
                    }
                    Err(e) => tracing::warn!("Skipping manifest {}: {}", manifest.display(), e),
                }
            }
        }

        projects
    }

    /// All declared dependencies of the project, sorted by ecosystem and name.
    pub fn collect(&self, root: &Path) -> Vec<Dependency> {
        let mut dependencies: Vec<Dependency> = self
            .projects(root)
            .into_iter()
            .flat_map(|p| p.dependencies)
            .collect();

        dependencies.sort_by(|a, b| {
            a.ecosystem
                .cmp(&b.ecosystem)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.is_dev.cmp(&b.is_dev))
        });
        dependencies
    }
}

impl Default for DependencyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_without_manifest_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = DependencyRegistry::with_defaults();
        assert!(registry.collect(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_collect_missing_root_is_empty() {
        let registry = DependencyRegistry::with_defaults();
        assert!(registry.collect(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_collect_both_ecosystems_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"name": "web", "dependencies": {"zod": "3", "express": "4"}}"#,
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("Cargo.toml"),
            "[package]\nname = \"core\"\n\n[dependencies]\nserde = \"1\"\n",
        )
        .unwrap();

        let deps = DependencyRegistry::with_defaults().collect(temp_dir.path());
        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["express", "zod", "serde"]);
    }

    #[test]
    fn test_malformed_manifest_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{ not json").unwrap();

        let registry = DependencyRegistry::with_defaults();
        assert!(registry.collect(temp_dir.path()).is_empty());
    }
}
