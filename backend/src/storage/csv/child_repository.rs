//! # Child Repository
//!
//! Each child lives in its own directory under the guardian's `children/`
//! directory; the profile itself is `child.yaml`. The roster is discovered by
//! scanning those directories.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::fs;

use super::connection::CsvConnection;
use super::write_batch::WriteBatch;
use crate::domain::models::child::Child;
use crate::storage::traits::ChildStorage;

#[derive(Clone)]
pub struct ChildRepository {
    connection: CsvConnection,
}

impl ChildRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Load one child as the batch would leave it
    pub(crate) fn load_child(
        &self,
        batch: &WriteBatch,
        guardian_id: &str,
        child_id: &str,
    ) -> Result<Option<Child>> {
        let path = self.connection.child_file_path(guardian_id, child_id);
        let Some(yaml) = batch.read_to_string(&path)? else {
            return Ok(None);
        };

        let child: Child = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        // The directory name is derived from the ID; guard against collisions
        if child.id != child_id {
            warn!("{} holds child {} instead of {}", path.display(), child.id, child_id);
            return Ok(None);
        }
        Ok(Some(child))
    }

    /// Discover all children by scanning directories
    pub(crate) fn load_children(&self, batch: &WriteBatch, guardian_id: &str) -> Result<Vec<Child>> {
        let children_dir = self.connection.children_directory(guardian_id);
        if !children_dir.exists() {
            debug!("Children directory doesn't exist yet, returning empty roster");
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(&children_dir)? {
            let path = entry?.path();

            // Skip files, only process directories
            if !path.is_dir() {
                continue;
            }

            let yaml_path = path.join("child.yaml");
            let yaml = match batch.read_to_string(&yaml_path) {
                Ok(Some(yaml)) => yaml,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Error reading {}: {}", yaml_path.display(), e);
                    continue;
                }
            };

            match serde_yaml::from_str::<Child>(&yaml) {
                Ok(child) => children.push(child),
                Err(e) => warn!("Skipping unreadable child profile {}: {}", yaml_path.display(), e),
            }
        }

        // Sort children by name for consistent ordering
        children.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(children)
    }

    pub(crate) fn stage_child(&self, batch: &mut WriteBatch, guardian_id: &str, child: &Child) -> Result<()> {
        let yaml = serde_yaml::to_string(child)?;
        batch.put(self.connection.child_file_path(guardian_id, &child.id), yaml.into_bytes());
        Ok(())
    }

    /// Stage removal of the child's whole directory (profile, history, owned items)
    pub(crate) fn stage_delete_child(&self, batch: &mut WriteBatch, guardian_id: &str, child_id: &str) {
        batch.delete(self.connection.child_directory(guardian_id, child_id));
    }
}

#[async_trait]
impl ChildStorage for ChildRepository {
    async fn get_child(&self, guardian_id: &str, child_id: &str) -> Result<Option<Child>> {
        self.load_child(&WriteBatch::new(), guardian_id, child_id)
    }

    async fn list_children(&self, guardian_id: &str) -> Result<Vec<Child>> {
        self.load_children(&WriteBatch::new(), guardian_id)
    }
}
