//! Declared project dependencies.
//!
//! Manifests (`package.json`, `Cargo.toml`) are read when present; a project
//! without any manifest simply has no dependencies.

pub mod cargo;
pub mod npm;
pub mod resolver;

use serde::{Deserialize, Serialize};

/// Supported package ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Cargo,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Cargo => "cargo",
        }
    }

    /// Returns the manifest file names for this ecosystem
    pub fn manifest_names(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Npm => &["package.json"],
            Ecosystem::Cargo => &["Cargo.toml"],
        }
    }
}

/// A declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub name: String,
    /// Version requirement as written in the manifest
    pub version: String,
    pub ecosystem: Ecosystem,
    pub is_dev: bool,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: Ecosystem) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem,
            is_dev: false,
        }
    }

    pub fn with_dev(mut self, is_dev: bool) -> Self {
        self.is_dev = is_dev;
        self
    }
}

/// Information about a project manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub ecosystem: Ecosystem,
    pub manifest_path: String,
    pub dependencies: Vec<Dependency>,
}

impl ProjectInfo {
    pub fn new(
        name: impl Into<String>,
        ecosystem: Ecosystem,
        manifest_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            ecosystem,
            manifest_path: manifest_path.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

pub use cargo::CargoResolver;
pub use npm::NpmResolver;
pub use resolver::{DependencyRegistry, DependencyResolver};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_as_str() {
        assert_eq!(Ecosystem::Cargo.as_str(), "cargo");
        assert_eq!(Ecosystem::Npm.as_str(), "npm");
    }

    #[test]
    fn test_ecosystem_manifest_names() {
        assert_eq!(Ecosystem::Cargo.manifest_names(), &["Cargo.toml"]);
        assert_eq!(Ecosystem::Npm.manifest_names(), &["package.json"]);
    }

    #[test]
    fn test_dependency_builder() {
        let dep = Dependency::new("jest", "^29.0.0", Ecosystem::Npm).with_dev(true);
        assert_eq!(dep.name, "jest");
        assert!(dep.is_dev);
    }

    #[test]
    fn test_dependency_serialization() {
        let dep = Dependency::new("serde", "1.0", Ecosystem::Cargo);
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["ecosystem"], "cargo");
        assert_eq!(json["isDev"], false);
    }
}
