//! # Reward Repository
//!
//! The reward catalog of a guardian is a single YAML document,
//! `rewards.yaml`, kept in creation order.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::connection::CsvConnection;
use super::write_batch::WriteBatch;
use crate::domain::models::reward::Reward;
use crate::storage::traits::RewardStorage;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RewardCatalog {
    #[serde(default)]
    rewards: Vec<Reward>,
}

#[derive(Clone)]
pub struct RewardRepository {
    connection: CsvConnection,
}

impl RewardRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    pub(crate) fn load_rewards(&self, batch: &WriteBatch, guardian_id: &str) -> Result<Vec<Reward>> {
        let path = self.connection.rewards_file_path(guardian_id);
        match batch.read_to_string(&path)? {
            Some(yaml) if !yaml.trim().is_empty() => {
                let catalog: RewardCatalog = serde_yaml::from_str(&yaml)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                Ok(catalog.rewards)
            }
            _ => Ok(Vec::new()),
        }
    }

    pub(crate) fn stage_rewards(&self, batch: &mut WriteBatch, guardian_id: &str, rewards: Vec<Reward>) -> Result<()> {
        let yaml = serde_yaml::to_string(&RewardCatalog { rewards })?;
        batch.put(self.connection.rewards_file_path(guardian_id), yaml.into_bytes());
        Ok(())
    }

    /// Insert or replace a single reward
    pub(crate) fn stage_reward(&self, batch: &mut WriteBatch, guardian_id: &str, reward: &Reward) -> Result<()> {
        let mut rewards = self.load_rewards(batch, guardian_id)?;
        match rewards.iter_mut().find(|r| r.id == reward.id) {
            Some(existing) => *existing = reward.clone(),
            None => rewards.push(reward.clone()),
        }
        self.stage_rewards(batch, guardian_id, rewards)
    }

    /// Returns true if the reward existed
    pub(crate) fn stage_delete_reward(&self, batch: &mut WriteBatch, guardian_id: &str, reward_id: &str) -> Result<bool> {
        let mut rewards = self.load_rewards(batch, guardian_id)?;
        let before = rewards.len();
        rewards.retain(|r| r.id != reward_id);
        if rewards.len() == before {
            return Ok(false);
        }
        self.stage_rewards(batch, guardian_id, rewards)?;
        Ok(true)
    }

    /// Take a child off every eligibility list. A reward left with no
    /// eligible child is removed from the catalog.
    pub(crate) fn stage_remove_child(
        &self,
        batch: &mut WriteBatch,
        guardian_id: &str,
        child_id: &str,
    ) -> Result<EligibilityCleanup> {
        let mut rewards = self.load_rewards(batch, guardian_id)?;
        let mut cleanup = EligibilityCleanup::default();
        for reward in rewards.iter_mut() {
            let before = reward.eligible_children.len();
            reward.eligible_children.retain(|id| id != child_id);
            if reward.eligible_children.len() != before {
                if reward.eligible_children.is_empty() {
                    cleanup.removed += 1;
                } else {
                    cleanup.updated += 1;
                }
            }
        }
        if cleanup.updated + cleanup.removed > 0 {
            rewards.retain(|r| !r.eligible_children.is_empty());
            self.stage_rewards(batch, guardian_id, rewards)?;
        }
        Ok(cleanup)
    }
}

/// Outcome of taking a child off the eligibility lists
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityCleanup {
    /// Rewards still eligible for someone else
    pub updated: usize,
    /// Rewards whose only eligible child was removed
    pub removed: usize,
}

#[async_trait]
impl RewardStorage for RewardRepository {
    async fn get_reward(&self, guardian_id: &str, reward_id: &str) -> Result<Option<Reward>> {
        let rewards = self.load_rewards(&WriteBatch::new(), guardian_id)?;
        Ok(rewards.into_iter().find(|r| r.id == reward_id))
    }

    async fn list_rewards(&self, guardian_id: &str) -> Result<Vec<Reward>> {
        self.load_rewards(&WriteBatch::new(), guardian_id)
    }
}
