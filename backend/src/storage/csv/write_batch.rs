//! # Write Batch
//!
//! Collects file writes and deletions and applies them together. Every staged
//! file is first written next to its target as `<name>.tmp`; only when all
//! temp files are on disk are they renamed over their targets, and only then
//! are staged deletions carried out. A failure while writing temp files
//! removes them again and leaves every target untouched.
//!
//! Renames are applied one at a time. A crash or rename failure part way
//! through phase 2 can leave some targets replaced and others not.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum StagedWrite {
    Put(Vec<u8>),
    Delete,
}

#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: BTreeMap<PathBuf, StagedWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the full new content of a file, replacing anything staged before
    pub fn put<P: Into<PathBuf>>(&mut self, path: P, content: Vec<u8>) {
        self.writes.insert(path.into(), StagedWrite::Put(content));
    }

    /// Stage removal of a file or a whole directory
    pub fn delete<P: Into<PathBuf>>(&mut self, path: P) {
        self.writes.insert(path.into(), StagedWrite::Delete);
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Read a file as this batch would leave it: staged content wins over the
    /// committed file. Returns `None` when the file doesn't exist, or when it,
    /// or a directory containing it, is staged for deletion.
    pub fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        for (staged_path, write) in &self.writes {
            if let StagedWrite::Delete = write {
                if path.starts_with(staged_path) {
                    return Ok(None);
                }
            }
        }

        match self.writes.get(path) {
            Some(StagedWrite::Put(content)) => {
                let text = String::from_utf8(content.clone())
                    .with_context(|| format!("Staged content for {} is not UTF-8", path.display()))?;
                Ok(Some(text))
            }
            Some(StagedWrite::Delete) => Ok(None),
            None => match fs::read_to_string(path) {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
            },
        }
    }

    /// Apply every staged change
    pub fn commit(self) -> Result<()> {
        if self.writes.is_empty() {
            return Ok(());
        }

        // Phase 1: write temp files next to their targets
        let mut written: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (path, write) in &self.writes {
            if let StagedWrite::Put(content) = write {
                let temp_path = Self::temp_path(path);
                if let Err(e) = Self::write_temp(path, &temp_path, content) {
                    for (temp, _) in &written {
                        Self::discard_temp(temp);
                    }
                    Self::discard_temp(&temp_path);
                    return Err(e);
                }
                written.push((temp_path, path.clone()));
            }
        }

        // Phase 2: move them into place
        for (temp_path, path) in &written {
            fs::rename(temp_path, path)
                .with_context(|| format!("Failed to replace {}", path.display()))?;
        }

        // Phase 3: deletions
        for (path, write) in &self.writes {
            if let StagedWrite::Delete = write {
                Self::remove(path)?;
            }
        }

        debug!("Committed write batch with {} change(s)", self.writes.len());
        Ok(())
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }

    fn discard_temp(temp_path: &Path) {
        if let Err(e) = fs::remove_file(temp_path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", temp_path.display(), e);
            }
        }
    }

    fn write_temp(path: &Path, temp_path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))
    }

    fn remove(path: &Path) -> Result<()> {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Nothing to delete at {}", path.display());
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_writes_all_files() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.yaml");
        let b = temp_dir.path().join("nested").join("b.csv");

        let mut batch = WriteBatch::new();
        batch.put(&a, b"alpha".to_vec());
        batch.put(&b, b"beta".to_vec());
        assert_eq!(batch.len(), 2);
        batch.commit().unwrap();

        assert_eq!(fs::read_to_string(&a).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(&b).unwrap(), "beta");
        assert!(!temp_dir.path().join("a.yaml.tmp").exists());
    }

    #[test]
    fn test_dropped_batch_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.yaml");
        fs::write(&a, "original").unwrap();

        let mut batch = WriteBatch::new();
        batch.put(&a, b"changed".to_vec());
        drop(batch);

        assert_eq!(fs::read_to_string(&a).unwrap(), "original");
    }

    #[test]
    fn test_read_sees_staged_content() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.yaml");
        fs::write(&a, "original").unwrap();

        let mut batch = WriteBatch::new();
        assert_eq!(batch.read_to_string(&a).unwrap().as_deref(), Some("original"));

        batch.put(&a, b"staged".to_vec());
        assert_eq!(batch.read_to_string(&a).unwrap().as_deref(), Some("staged"));

        batch.delete(temp_dir.path());
        assert_eq!(batch.read_to_string(&a).unwrap(), None);
    }

    #[test]
    fn test_delete_removes_directories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("child");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("child.yaml"), "x").unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(&dir);
        batch.delete(temp_dir.path().join("missing.csv"));
        batch.commit().unwrap();

        assert!(!dir.exists());
    }

    #[test]
    fn test_failed_write_leaves_targets_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("a.yaml");
        fs::write(&good, "original").unwrap();

        // A regular file where a parent directory is needed makes the write fail
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let bad = blocker.join("b.csv");

        let mut batch = WriteBatch::new();
        batch.put(&good, b"changed".to_vec());
        batch.put(&bad, b"never".to_vec());
        assert!(batch.commit().is_err());

        assert_eq!(fs::read_to_string(&good).unwrap(), "original");
        assert!(!temp_dir.path().join("a.yaml.tmp").exists());
    }
}
