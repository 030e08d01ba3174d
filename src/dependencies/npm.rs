//! NPM/Node.js manifest reader.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{MemoryBankError, Result};

use super::resolver::DependencyResolver;
use super::{Dependency, Ecosystem, ProjectInfo};

/// Resolver for NPM/Node.js dependencies.
pub struct NpmResolver;

impl NpmResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NpmResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyResolver for NpmResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn manifest_names(&self) -> &[&str] {
        Ecosystem::Npm.manifest_names()
    }

    fn parse_manifest(&self, content: &str, path: &Path) -> Result<ProjectInfo> {
        let pkg: PackageJson = serde_json::from_str(content).map_err(|e| MemoryBankError::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        // Private/unnamed packages are common at the root of applications
        let name = pkg.name.unwrap_or_else(|| {
            path.parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        });

        let mut project = ProjectInfo::new(name, Ecosystem::Npm, path.to_string_lossy());
        if let Some(v) = pkg.version {
            project = project.with_version(v);
        }
        project.description = pkg.description;

        let sections = [
            (pkg.dependencies, false),
            (pkg.dev_dependencies, true),
            (pkg.peer_dependencies, false),
            (pkg.optional_dependencies, false),
        ];

        for (section, is_dev) in sections {
            for (name, version) in section.unwrap_or_default() {
                project
                    .dependencies
                    .push(Dependency::new(name, version, Ecosystem::Npm).with_dev(is_dev));
            }
        }

        Ok(project)
    }
}

/// Minimal representation of package.json
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    peer_dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    optional_dependencies: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_package_json() {
        let resolver = NpmResolver::new();
        let content = r#"
{
    "name": "test-project",
    "version": "1.0.0",
    "description": "Test app",
    "dependencies": {
        "react": "^18.0.0",
        "axios": "1.6.0"
    },
    "devDependencies": {
        "typescript": "^5.0.0",
        "@types/react": "^18.0.0"
    }
}
"#;

        let project = resolver
            .parse_manifest(content, Path::new("package.json"))
            .unwrap();

        assert_eq!(project.name, "test-project");
        assert_eq!(project.version, Some("1.0.0".to_string()));
        assert_eq!(project.description.as_deref(), Some("Test app"));
        assert_eq!(project.dependencies.len(), 4);

        let react = project.dependencies.iter().find(|d| d.name == "react").unwrap();
        assert_eq!(react.version, "^18.0.0");
        assert!(!react.is_dev);

        let typescript = project.dependencies.iter().find(|d| d.name == "typescript").unwrap();
        assert!(typescript.is_dev);

        assert!(project.dependencies.iter().any(|d| d.name == "@types/react"));
    }

    #[test]
    fn test_parse_unnamed_package_json() {
        let resolver = NpmResolver::new();
        let project = resolver
            .parse_manifest("{}", Path::new("/work/my-app/package.json"))
            .unwrap();

        assert_eq!(project.name, "my-app");
        assert!(project.version.is_none());
        assert!(project.dependencies.is_empty());
    }

    #[test]
    fn test_parse_invalid_package_json() {
        let resolver = NpmResolver::new();
        let result = resolver.parse_manifest("{", Path::new("package.json"));
        assert!(matches!(result, Err(MemoryBankError::Manifest { .. })));
    }
}
