//! Cargo manifest reader.

use std::path::Path;

use crate::error::{MemoryBankError, Result};

use super::resolver::DependencyResolver;
use super::{Dependency, Ecosystem, ProjectInfo};

/// Resolver for Rust/Cargo dependencies.
pub struct CargoResolver;

impl CargoResolver {
    pub fn new() -> Self {
        Self
    }

    fn dependency_version(value: &toml::Value) -> String {
        match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Table(t) => t
                .get("version")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .or_else(|| t.get("path").and_then(|p| p.as_str()).map(|p| format!("path:{}", p)))
                .or_else(|| t.get("git").and_then(|g| g.as_str()).map(|g| format!("git:{}", g)))
                .or_else(|| {
                    t.get("workspace")
                        .and_then(|w| w.as_bool())
                        .filter(|w| *w)
                        .map(|_| "workspace".to_string())
                })
                .unwrap_or_else(|| "*".to_string()),
            _ => "*".to_string(),
        }
    }
}

impl Default for CargoResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyResolver for CargoResolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Cargo
    }

    fn manifest_names(&self) -> &[&str] {
        Ecosystem::Cargo.manifest_names()
    }

    fn parse_manifest(&self, content: &str, path: &Path) -> Result<ProjectInfo> {
        let toml_value: toml::Value =
            content
                .parse()
                .map_err(|e: toml::de::Error| MemoryBankError::Manifest {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;

        let package = toml_value.get("package");
        let name = package
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("workspace")
            .to_string();

        let mut project = ProjectInfo::new(name, Ecosystem::Cargo, path.to_string_lossy());
        project.version = package
            .and_then(|p| p.get("version"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        project.description = package
            .and_then(|p| p.get("description"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        for (section, is_dev) in [("dependencies", false), ("dev-dependencies", true)] {
            if let Some(table) = toml_value.get(section).and_then(|d| d.as_table()) {
                for (name, value) in table {
                    project.dependencies.push(
                        Dependency::new(name, Self::dependency_version(value), Ecosystem::Cargo)
                            .with_dev(is_dev),
                    );
                }
            }
        }

        Ok(project)
    }
}
