//! # Ownership Repository
//!
//! Purchase counts per child, stored in `{child_directory}/items.yaml` as a
//! map from reward ID to count:
//!
//! ```yaml
//! reward::1737367200000::3fa2c9d1: 2
//! reward::1737453600000::9b0e1f2a: 1
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

use super::connection::CsvConnection;
use super::write_batch::WriteBatch;
use crate::domain::models::reward::OwnedItem;
use crate::storage::traits::OwnershipStorage;

type OwnedCounts = BTreeMap<String, u32>;

#[derive(Clone)]
pub struct OwnershipRepository {
    connection: CsvConnection,
}

impl OwnershipRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn load_counts(&self, batch: &WriteBatch, guardian_id: &str, child_id: &str) -> Result<OwnedCounts> {
        let path = self.connection.items_file_path(guardian_id, child_id);
        match batch.read_to_string(&path)? {
            Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(&yaml)
                .with_context(|| format!("Failed to parse {}", path.display())),
            _ => Ok(OwnedCounts::new()),
        }
    }

    pub(crate) fn load_owned_count(
        &self,
        batch: &WriteBatch,
        guardian_id: &str,
        child_id: &str,
        reward_id: &str,
    ) -> Result<u32> {
        let counts = self.load_counts(batch, guardian_id, child_id)?;
        Ok(counts.get(reward_id).copied().unwrap_or(0))
    }

    /// Stage a new count; a count of zero removes the reward from the map
    pub(crate) fn stage_owned_count(
        &self,
        batch: &mut WriteBatch,
        guardian_id: &str,
        child_id: &str,
        reward_id: &str,
        count: u32,
    ) -> Result<()> {
        let mut counts = self.load_counts(batch, guardian_id, child_id)?;
        if count == 0 {
            counts.remove(reward_id);
        } else {
            counts.insert(reward_id.to_string(), count);
        }

        let yaml = serde_yaml::to_string(&counts)?;
        batch.put(self.connection.items_file_path(guardian_id, child_id), yaml.into_bytes());
        Ok(())
    }
}

#[async_trait]
impl OwnershipStorage for OwnershipRepository {
    async fn get_owned_count(&self, guardian_id: &str, child_id: &str, reward_id: &str) -> Result<u32> {
        self.load_owned_count(&WriteBatch::new(), guardian_id, child_id, reward_id)
    }

    async fn list_owned_items(&self, guardian_id: &str, child_id: &str) -> Result<Vec<OwnedItem>> {
        let counts = self.load_counts(&WriteBatch::new(), guardian_id, child_id)?;
        Ok(counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(reward_id, count)| OwnedItem { reward_id, count })
            .collect())
    }
}
