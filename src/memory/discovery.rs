use std::io;
use std::path::Path;

use crate::config::BankConfig;
use crate::error::{MemoryBankError, Result};
use crate::memory::fs::BankFs;

/// Enumerates eligible documents under the documentation root.
///
/// Paths are relative to the root with `/` separators, sorted, and free of
/// duplicates. Hidden entries and symlinks are skipped.
pub struct MemoryBankDiscoverer<'a> {
    fs: &'a dyn BankFs,
    config: &'a BankConfig,
}

impl<'a> MemoryBankDiscoverer<'a> {
    pub fn new(fs: &'a dyn BankFs, config: &'a BankConfig) -> Self {
        Self { fs, config }
    }

    /// An absent root yields an empty list. Permission denial on the root
    /// itself is the only failure.
    pub fn discover(&self, docs_root: &Path) -> Result<Vec<String>> {
        let mut files = Vec::new();

        match self.fs.read_dir(docs_root) {
            Ok(_) => self.visit(docs_root, "", &mut files),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(MemoryBankError::from_io(e, docs_root));
            }
            Err(e) => {
                tracing::debug!("No memory bank at {}: {}", docs_root.display(), e);
                return Ok(files);
            }
        }

        files.sort();
        files.dedup();
        tracing::debug!("Discovered {} memory bank files", files.len());
        Ok(files)
    }

    fn visit(&self, dir: &Path, prefix: &str, files: &mut Vec<String>) {
        let entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries {
            if entry.is_hidden() || entry.is_symlink {
                continue;
            }

            let relative = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };

            if entry.is_dir {
                self.visit(&dir.join(&entry.name), &relative, files);
            } else if self.config.is_eligible(&entry.name) {
                files.push(relative);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fs::StdFs;
    use std::fs;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "# doc\n").unwrap();
    }

    #[test]
    fn test_missing_root_is_empty() {
        let config = BankConfig::default();
        let discoverer = MemoryBankDiscoverer::new(&StdFs, &config);
        assert!(discoverer.discover(Path::new("/no/such/memory-bank")).unwrap().is_empty());
    }

    #[test]
    fn test_nested_documents() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_file(root, "projectbrief.md");
        create_file(root, "features/auth.md");
        create_file(root, "features/deep/flow.MD");
        create_file(root, "api/notes.txt");
        create_file(root, ".drafts/secret.md");

        let config = BankConfig::default();
        let files = MemoryBankDiscoverer::new(&StdFs, &config).discover(root).unwrap();
        assert_eq!(
            files,
            vec!["features/auth.md", "features/deep/flow.MD", "projectbrief.md"]
        );
    }

    #[test]
    fn test_counts_every_eligible_document() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            create_file(temp_dir.path(), &format!("doc{}.md", i));
            create_file(temp_dir.path(), &format!("group{}/doc.md", i));
        }

        let config = BankConfig::default();
        let files = MemoryBankDiscoverer::new(&StdFs, &config).discover(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 10);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "real.md");
        std::os::unix::fs::symlink(temp_dir.path().join("real.md"), temp_dir.path().join("alias.md")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("loop")).unwrap();

        let config = BankConfig::default();
        let files = MemoryBankDiscoverer::new(&StdFs, &config).discover(temp_dir.path()).unwrap();
        assert_eq!(files, vec!["real.md"]);
    }
}
