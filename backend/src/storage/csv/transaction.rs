//! # Store Transaction
//!
//! A unit of work over one guardian's documents. Beginning a transaction takes
//! the guardian's write lock; every read made through it sees the changes
//! staged so far; `commit` applies all staged changes together. Dropping a
//! transaction without committing discards everything it staged.

use anyhow::Result;
use log::debug;
use tokio::sync::OwnedMutexGuard;

use super::child_repository::ChildRepository;
use super::connection::CsvConnection;
use super::history_repository::HistoryRepository;
use super::ownership_repository::OwnershipRepository;
use super::picture_store::PictureStore;
use super::reward_repository::{EligibilityCleanup, RewardRepository};
use super::task_repository::TaskRepository;
use super::write_batch::WriteBatch;
use crate::domain::models::child::Child;
use crate::domain::models::history::HistoryEntry;
use crate::domain::models::reward::Reward;
use crate::domain::models::task::Task;

pub struct StoreTransaction {
    guardian_id: String,
    batch: WriteBatch,
    children: ChildRepository,
    tasks: TaskRepository,
    rewards: RewardRepository,
    ownership: OwnershipRepository,
    history: HistoryRepository,
    pictures: PictureStore,
    _guard: OwnedMutexGuard<()>,
}

impl StoreTransaction {
    /// Wait for the guardian's write lock and open a transaction
    pub async fn begin(connection: &CsvConnection, guardian_id: &str) -> Self {
        let guard = connection.lock_guardian(guardian_id).await;
        debug!("Began transaction for guardian {}", guardian_id);

        Self {
            guardian_id: guardian_id.to_string(),
            batch: WriteBatch::new(),
            children: ChildRepository::new(connection.clone()),
            tasks: TaskRepository::new(connection.clone()),
            rewards: RewardRepository::new(connection.clone()),
            ownership: OwnershipRepository::new(connection.clone()),
            history: HistoryRepository::new(connection.clone()),
            pictures: PictureStore::new(connection.clone()),
            _guard: guard,
        }
    }

    pub fn guardian_id(&self) -> &str {
        &self.guardian_id
    }

    // Children

    pub fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        self.children.load_child(&self.batch, &self.guardian_id, child_id)
    }

    pub fn list_children(&self) -> Result<Vec<Child>> {
        self.children.load_children(&self.batch, &self.guardian_id)
    }

    pub fn put_child(&mut self, child: &Child) -> Result<()> {
        self.children.stage_child(&mut self.batch, &self.guardian_id, child)
    }

    /// Remove the child's directory: profile, owned items and history
    pub fn delete_child(&mut self, child_id: &str) {
        self.children
            .stage_delete_child(&mut self.batch, &self.guardian_id, child_id)
    }

    // Tasks

    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        let tasks = self.tasks.load_tasks(&self.batch, &self.guardian_id)?;
        Ok(tasks.into_iter().find(|t| t.id == task_id))
    }

    pub fn put_task(&mut self, task: &Task) -> Result<()> {
        self.tasks.stage_task(&mut self.batch, &self.guardian_id, task)
    }

    pub fn delete_task(&mut self, task_id: &str) -> Result<bool> {
        self.tasks
            .stage_delete_task(&mut self.batch, &self.guardian_id, task_id)
    }

    pub fn delete_tasks_for_child(&mut self, child_id: &str) -> Result<usize> {
        self.tasks
            .stage_delete_tasks_for_child(&mut self.batch, &self.guardian_id, child_id)
    }

    // Rewards

    pub fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>> {
        let rewards = self.rewards.load_rewards(&self.batch, &self.guardian_id)?;
        Ok(rewards.into_iter().find(|r| r.id == reward_id))
    }

    pub fn put_reward(&mut self, reward: &Reward) -> Result<()> {
        self.rewards
            .stage_reward(&mut self.batch, &self.guardian_id, reward)
    }

    pub fn delete_reward(&mut self, reward_id: &str) -> Result<bool> {
        self.rewards
            .stage_delete_reward(&mut self.batch, &self.guardian_id, reward_id)
    }

    pub fn remove_child_from_rewards(&mut self, child_id: &str) -> Result<EligibilityCleanup> {
        self.rewards
            .stage_remove_child(&mut self.batch, &self.guardian_id, child_id)
    }

    // Owned items

    pub fn get_owned_count(&self, child_id: &str, reward_id: &str) -> Result<u32> {
        self.ownership
            .load_owned_count(&self.batch, &self.guardian_id, child_id, reward_id)
    }

    pub fn set_owned_count(&mut self, child_id: &str, reward_id: &str, count: u32) -> Result<()> {
        self.ownership
            .stage_owned_count(&mut self.batch, &self.guardian_id, child_id, reward_id, count)
    }

    // History

    /// The child's ledger in append order
    pub fn list_history(&self, child_id: &str) -> Result<Vec<HistoryEntry>> {
        self.history
            .load_entries(&self.batch, &self.guardian_id, child_id)
    }

    pub fn append_history(&mut self, child_id: &str, entry: &HistoryEntry) -> Result<()> {
        self.history
            .stage_append(&mut self.batch, &self.guardian_id, child_id, entry)
    }

    /// Replace an existing entry in place. Returns false if there was none.
    pub fn put_history_entry(&mut self, child_id: &str, entry: &HistoryEntry) -> Result<bool> {
        let mut entries = self.list_history(child_id)?;
        let Some(slot) = entries.iter_mut().find(|e| e.id == entry.id) else {
            return Ok(false);
        };
        *slot = entry.clone();
        self.history
            .stage_entries(&mut self.batch, &self.guardian_id, child_id, &entries)?;
        Ok(true)
    }

    // Pictures

    /// Stage the child's picture and return its reference
    pub fn put_picture(&mut self, child_id: &str, content_type: &str, bytes: &[u8]) -> Result<String> {
        self.pictures
            .stage_picture(&mut self.batch, &self.guardian_id, child_id, content_type, bytes)
    }

    pub fn delete_picture(&mut self, reference: &str) -> Result<()> {
        self.pictures
            .stage_delete_picture(&mut self.batch, &self.guardian_id, reference)
    }

    /// Apply every staged change and release the lock
    pub fn commit(self) -> Result<()> {
        debug!(
            "Committing {} change(s) for guardian {}",
            self.batch.len(),
            self.guardian_id
        );
        self.batch.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::history::PointAction;
    use crate::storage::csv::test_utils::{sample_child, sample_reward, sample_task, TestEnvironment, GUARDIAN_ID};
    use crate::storage::traits::{ChildStorage, HistoryStorage, OwnershipStorage, PictureStorage, RewardStorage};
    use chrono::Utc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_commit_applies_every_document() {
        let env = TestEnvironment::new().unwrap();
        let mut child = sample_child("Emma", 100);
        let mut reward = sample_reward("Ice cream", 40, 3, &[child.id.as_str()]);

        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        tx.put_child(&child).unwrap();
        tx.put_reward(&reward).unwrap();
        tx.commit().unwrap();

        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        child.debit(40).unwrap();
        reward.inventory -= 1;
        tx.put_child(&child).unwrap();
        tx.put_reward(&reward).unwrap();
        tx.set_owned_count(&child.id, &reward.id, 1).unwrap();
        tx.append_history(&child.id, &HistoryEntry::new("Ice cream", 40, PointAction::Subtract, Utc::now()))
            .unwrap();
        assert_eq!(tx.get_child(&child.id).unwrap().unwrap().points, 60);
        tx.commit().unwrap();

        let children = ChildRepository::new(env.connection.clone());
        let rewards = RewardRepository::new(env.connection.clone());
        let ownership = OwnershipRepository::new(env.connection.clone());
        let history = HistoryRepository::new(env.connection.clone());

        assert_eq!(children.get_child(GUARDIAN_ID, &child.id).await.unwrap().unwrap().points, 60);
        assert_eq!(rewards.get_reward(GUARDIAN_ID, &reward.id).await.unwrap().unwrap().inventory, 2);
        assert_eq!(ownership.get_owned_count(GUARDIAN_ID, &child.id, &reward.id).await.unwrap(), 1);
        assert_eq!(history.list_history(GUARDIAN_ID, &child.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let env = TestEnvironment::new().unwrap();
        let child = sample_child("Emma", 10);

        {
            let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
            tx.put_child(&child).unwrap();
            tx.put_task(&sample_task("Dishes", 20, &child.id)).unwrap();
        }

        let children = ChildRepository::new(env.connection.clone());
        assert!(children.list_children(GUARDIAN_ID).await.unwrap().is_empty());
        assert!(!env.connection.tasks_file_path(GUARDIAN_ID).exists());
    }

    #[tokio::test]
    async fn test_transactions_are_serialized_per_guardian() {
        let env = TestEnvironment::new().unwrap();

        let tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        let waiting = tokio::time::timeout(
            Duration::from_millis(50),
            StoreTransaction::begin(&env.connection, GUARDIAN_ID),
        )
        .await;
        assert!(waiting.is_err());

        drop(tx);
        let next = tokio::time::timeout(
            Duration::from_millis(50),
            StoreTransaction::begin(&env.connection, GUARDIAN_ID),
        )
        .await;
        assert!(next.is_ok());
    }

    #[tokio::test]
    async fn test_put_history_entry_replaces_in_place() {
        let env = TestEnvironment::new().unwrap();
        let child = sample_child("Emma", 0);
        let mut entry = HistoryEntry::new("Ice cream", 40, PointAction::Subtract, Utc::now());

        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        tx.put_child(&child).unwrap();
        tx.append_history(&child.id, &HistoryEntry::new("Dishes", 50, PointAction::Add, Utc::now()))
            .unwrap();
        tx.append_history(&child.id, &entry).unwrap();
        tx.commit().unwrap();

        entry.purchased = true;
        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        assert!(tx.put_history_entry(&child.id, &entry).unwrap());
        let unknown = HistoryEntry::new("Unknown", 1, PointAction::Add, Utc::now());
        assert!(!tx.put_history_entry(&child.id, &unknown).unwrap());
        tx.commit().unwrap();

        let history = HistoryRepository::new(env.connection.clone());
        let loaded = history
            .get_history_entry(GUARDIAN_ID, &child.id, &entry.id)
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.purchased);
        assert_eq!(history.list_history(GUARDIAN_ID, &child.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_picture_is_replaced_only_on_commit() {
        let env = TestEnvironment::new().unwrap();
        let mut child = sample_child("Emma", 0);
        let pictures = PictureStore::new(env.connection.clone());

        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        let reference = tx.put_picture(&child.id, "image/png", b"first").unwrap();
        child.picture = Some(reference.clone());
        tx.put_child(&child).unwrap();
        tx.commit().unwrap();

        {
            let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
            assert_eq!(tx.put_picture(&child.id, "image/png", b"second").unwrap(), reference);
            tx.put_child(&child).unwrap();
        }

        let picture = pictures.get_picture(GUARDIAN_ID, &reference).await.unwrap().unwrap();
        assert_eq!(picture.bytes, b"first".to_vec());
    }
}
