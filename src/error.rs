use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryBankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: String, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path escapes the memory bank: {0}")]
    InvalidPath(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("MCP error: {0}")]
    Mcp(String),
}

impl MemoryBankError {
    /// Maps an IO error on `path` to the crate error, keeping permission
    /// failures distinguishable for the caller.
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            MemoryBankError::PermissionDenied {
                path: path.display().to_string(),
            }
        } else {
            MemoryBankError::Io(err)
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MemoryBankError::Io(_) => "io",
            MemoryBankError::PermissionDenied { .. } => "permission_denied",
            MemoryBankError::Parse(_) => "parse",
            MemoryBankError::Manifest { .. } => "manifest",
            MemoryBankError::Config(_) => "config",
            MemoryBankError::Json(_) => "json",
            MemoryBankError::InvalidPath(_) => "invalid_path",
            MemoryBankError::InvalidTransition { .. } => "invalid_transition",
            MemoryBankError::Mcp(_) => "mcp",
        }
    }

    /// Tagged failure result handed to the glue layer.
    pub fn failure(&self, path: Option<&str>) -> FailureReport {
        let path = match self {
            MemoryBankError::PermissionDenied { path } => Some(path.clone()),
            MemoryBankError::Manifest { path, .. } => Some(path.clone()),
            _ => path.map(|p| p.to_string()),
        };

        FailureReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
            path,
        }
    }
}

/// Serializable failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

pub type Result<T> = std::result::Result<T, MemoryBankError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    #[test]
    fn test_from_io_permission_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let mapped = MemoryBankError::from_io(err, Path::new("/secret"));
        assert!(matches!(mapped, MemoryBankError::PermissionDenied { ref path } if path == "/secret"));
    }

    #[test]
    fn test_from_io_other() {
        let err = io::Error::new(io::ErrorKind::Other, "boom");
        let mapped = MemoryBankError::from_io(err, Path::new("x"));
        assert_eq!(mapped.kind(), "io");
    }

    #[test]
    fn test_failure_report_carries_path() {
        let err = MemoryBankError::PermissionDenied {
            path: "/root/project".to_string(),
        };
        let report = err.failure(None);
        assert_eq!(report.kind, "permission_denied");
        assert_eq!(report.path.as_deref(), Some("/root/project"));
        assert!(report.message.contains("/root/project"));
    }

    #[test]
    fn test_failure_report_uses_given_path() {
        let err = MemoryBankError::Parse("bad".to_string());
        let report = err.failure(Some("src/a.ts"));
        assert_eq!(report.path.as_deref(), Some("src/a.ts"));
    }
}
