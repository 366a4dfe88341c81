//! # Storage Traits
//!
//! Read-side abstractions the domain services query through. Writes that
//! touch more than one document go through a
//! [`StoreTransaction`](crate::storage::csv::StoreTransaction) so they are
//! committed all together or not at all.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::child::Child;
use crate::domain::models::guardian::Guardian;
use crate::domain::models::history::HistoryEntry;
use crate::domain::models::reward::{OwnedItem, Reward};
use crate::domain::models::task::{Task, TaskStatus};

/// Guardian account registry
#[async_trait]
pub trait GuardianStorage: Send + Sync {
    /// Retrieve a guardian by ID
    async fn get_guardian(&self, guardian_id: &str) -> Result<Option<Guardian>>;

    /// Retrieve a guardian by (case-insensitive) email
    async fn find_guardian_by_email(&self, email: &str) -> Result<Option<Guardian>>;

    /// Store a new guardian.
    /// Returns false, and stores nothing, when the email is already registered.
    async fn insert_guardian(&self, guardian: &Guardian) -> Result<bool>;

    /// Replace an existing guardian record
    async fn update_guardian(&self, guardian: &Guardian) -> Result<()>;
}

/// A guardian's child roster
#[async_trait]
pub trait ChildStorage: Send + Sync {
    /// Retrieve a specific child by ID
    async fn get_child(&self, guardian_id: &str, child_id: &str) -> Result<Option<Child>>;

    /// List all children ordered by name
    async fn list_children(&self, guardian_id: &str) -> Result<Vec<Child>>;
}

/// A guardian's chores
#[async_trait]
pub trait TaskStorage: Send + Sync {
    /// Retrieve a specific task by ID
    async fn get_task(&self, guardian_id: &str, task_id: &str) -> Result<Option<Task>>;

    /// List tasks, optionally filtered by assigned child and status.
    /// Returns tasks ordered by creation time descending (most recent first)
    async fn list_tasks(
        &self,
        guardian_id: &str,
        child_id: Option<&str>,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>>;
}

/// A guardian's reward catalog
#[async_trait]
pub trait RewardStorage: Send + Sync {
    /// Retrieve a specific reward by ID
    async fn get_reward(&self, guardian_id: &str, reward_id: &str) -> Result<Option<Reward>>;

    /// List every reward in catalog order
    async fn list_rewards(&self, guardian_id: &str) -> Result<Vec<Reward>>;
}

/// Per-child purchase counts
#[async_trait]
pub trait OwnershipStorage: Send + Sync {
    /// How many units of a reward the child owns (0 if none)
    async fn get_owned_count(&self, guardian_id: &str, child_id: &str, reward_id: &str) -> Result<u32>;

    /// Every reward the child owns at least once
    async fn list_owned_items(&self, guardian_id: &str, child_id: &str) -> Result<Vec<OwnedItem>>;
}

/// Per-child point ledger
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// List a child's history ordered by completion date descending (most recent first)
    async fn list_history(&self, guardian_id: &str, child_id: &str) -> Result<Vec<HistoryEntry>>;

    /// Retrieve a single entry
    async fn get_history_entry(
        &self,
        guardian_id: &str,
        child_id: &str,
        entry_id: &str,
    ) -> Result<Option<HistoryEntry>>;
}

/// Binary content of a stored picture
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Blob store for profile pictures
#[async_trait]
pub trait PictureStorage: Send + Sync {
    /// Fetch a picture by reference
    async fn get_picture(&self, guardian_id: &str, reference: &str) -> Result<Option<Picture>>;
}
