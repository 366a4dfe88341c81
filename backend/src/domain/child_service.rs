//! Child roster management.
//!
//! ## Business Rules
//!
//! - Names are trimmed, non-empty and at most 100 characters
//! - Birthdays are `YYYY-MM-DD` and not in the future
//! - New children start with 0 points
//! - Deleting a child also deletes its tasks, owned items, history and
//!   picture, and takes it off every reward's eligibility list. Rewards left
//!   with no eligible child are deleted.

use chrono::{NaiveDate, Utc};
use log::{error, info, warn};

use crate::domain::commands::child::{
    ChildResult, CreateChildCommand, DeleteChildResult, UpdateChildCommand, UploadPictureCommand,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::child::Child;
use crate::storage::csv::{extension_for_content_type, ChildRepository, CsvConnection, PictureStore};
use crate::storage::{ChildStorage, Picture, PictureStorage, StoreTransaction};

const MAX_NAME_LENGTH: usize = 100;

/// Service for managing a guardian's children
#[derive(Clone)]
pub struct ChildService {
    connection: CsvConnection,
    children: ChildRepository,
    pictures: PictureStore,
    max_picture_bytes: usize,
}

impl ChildService {
    pub fn new(connection: CsvConnection, max_picture_bytes: usize) -> Self {
        Self {
            children: ChildRepository::new(connection.clone()),
            pictures: PictureStore::new(connection.clone()),
            connection,
            max_picture_bytes,
        }
    }

    /// Create a new child
    pub async fn create_child(&self, guardian_id: &str, command: CreateChildCommand) -> DomainResult<ChildResult> {
        info!("Creating child: name={}, birthday={}", command.name, command.birthday);

        let name = Self::validate_name(&command.name)?;
        let birthday = Self::parse_birthday(&command.birthday)?;

        let now = Utc::now();
        let child = Child {
            id: Child::generate_id(now),
            name,
            gender: command.gender,
            birthday,
            picture: None,
            points: 0,
            created_at: now,
            updated_at: now,
        };

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        tx.put_child(&child)?;
        tx.commit()?;

        info!("Created child: {} with ID: {}", child.name, child.id);
        Ok(ChildResult {
            child,
            success_message: "Child created successfully".to_string(),
        })
    }

    /// Get a child by ID
    pub async fn get_child(&self, guardian_id: &str, child_id: &str) -> DomainResult<Child> {
        match self.children.get_child(guardian_id, child_id).await? {
            Some(child) => Ok(child),
            None => {
                warn!("Child not found: {}", child_id);
                Err(DomainError::not_found("Child", child_id))
            }
        }
    }

    /// List all children, ordered by name
    pub async fn list_children(&self, guardian_id: &str) -> DomainResult<Vec<Child>> {
        let children = self.children.list_children(guardian_id).await?;
        info!("Found {} children for guardian {}", children.len(), guardian_id);
        Ok(children)
    }

    /// Update an existing child
    pub async fn update_child(&self, guardian_id: &str, command: UpdateChildCommand) -> DomainResult<ChildResult> {
        info!("Updating child: {}", command.child_id);

        // Validate before taking the lock
        let name = command.name.as_deref().map(Self::validate_name).transpose()?;
        let birthday = command.birthday.as_deref().map(Self::parse_birthday).transpose()?;

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut child = tx
            .get_child(&command.child_id)?
            .ok_or_else(|| DomainError::not_found("Child", &command.child_id))?;

        if let Some(name) = name {
            child.name = name;
        }
        if let Some(gender) = command.gender {
            child.gender = gender;
        }
        if let Some(birthday) = birthday {
            child.birthday = birthday;
        }
        child.updated_at = Utc::now();

        tx.put_child(&child)?;
        tx.commit()?;

        info!("Updated child: {} with ID: {}", child.name, child.id);
        Ok(ChildResult {
            child,
            success_message: "Child updated successfully".to_string(),
        })
    }

    /// Delete a child together with everything that belongs to it
    pub async fn delete_child(&self, guardian_id: &str, child_id: &str) -> DomainResult<DeleteChildResult> {
        info!("Deleting child: {}", child_id);

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let child = tx
            .get_child(child_id)?
            .ok_or_else(|| DomainError::not_found("Child", child_id))?;

        let removed_tasks = tx.delete_tasks_for_child(child_id)?;
        let cleanup = tx.remove_child_from_rewards(child_id)?;
        tx.delete_child(child_id);
        if let Some(reference) = &child.picture {
            // A malformed reference names no file of ours
            if let Err(e) = tx.delete_picture(reference) {
                warn!("Not deleting picture {} of child {}: {:#}", reference, child_id, e);
            }
        }
        tx.commit()?;

        info!(
            "Deleted child: {} with ID: {} ({} tasks removed, {} rewards updated, {} rewards removed)",
            child.name, child.id, removed_tasks, cleanup.updated, cleanup.removed
        );
        Ok(DeleteChildResult {
            child,
            removed_tasks,
            updated_rewards: cleanup.updated,
            removed_rewards: cleanup.removed,
            success_message: "Child deleted successfully".to_string(),
        })
    }

    /// Store a new profile picture, replacing any previous one
    pub async fn upload_picture(&self, guardian_id: &str, command: UploadPictureCommand) -> DomainResult<ChildResult> {
        info!(
            "Uploading picture for child {}: {} ({} bytes)",
            command.child_id,
            command.content_type,
            command.bytes.len()
        );

        if extension_for_content_type(&command.content_type).is_none() {
            return Err(DomainError::validation(format!(
                "Unsupported picture type '{}', expected PNG, JPEG, GIF or WebP",
                command.content_type
            )));
        }
        if command.bytes.is_empty() {
            return Err(DomainError::validation("Picture is empty"));
        }
        if command.bytes.len() > self.max_picture_bytes {
            return Err(DomainError::validation(format!(
                "Picture exceeds the maximum size of {} bytes",
                self.max_picture_bytes
            )));
        }

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut child = tx
            .get_child(&command.child_id)?
            .ok_or_else(|| DomainError::not_found("Child", &command.child_id))?;

        let reference = tx.put_picture(&child.id, &command.content_type, &command.bytes)?;
        let previous = child.picture.replace(reference.clone());
        child.updated_at = Utc::now();
        tx.put_child(&child)?;

        // A different image type is stored under a different name
        if let Some(previous) = previous.filter(|p| *p != reference) {
            if let Err(e) = tx.delete_picture(&previous) {
                warn!("Not deleting replaced picture {}: {:#}", previous, e);
            }
        }

        if let Err(e) = tx.commit() {
            error!("Failed to store picture for child {}: {:#}", child.id, e);
            return Err(e.into());
        }

        Ok(ChildResult {
            child,
            success_message: "Picture uploaded successfully".to_string(),
        })
    }

    /// Fetch a child's picture
    pub async fn get_picture(&self, guardian_id: &str, child_id: &str) -> DomainResult<Picture> {
        let child = self.get_child(guardian_id, child_id).await?;
        let reference = child
            .picture
            .ok_or_else(|| DomainError::not_found("Picture", child_id))?;

        self.pictures
            .get_picture(guardian_id, &reference)
            .await?
            .ok_or_else(|| DomainError::not_found("Picture", &reference))
    }

    /// Remove a child's picture
    pub async fn delete_picture(&self, guardian_id: &str, child_id: &str) -> DomainResult<ChildResult> {
        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut child = tx
            .get_child(child_id)?
            .ok_or_else(|| DomainError::not_found("Child", child_id))?;

        let reference = child
            .picture
            .take()
            .ok_or_else(|| DomainError::not_found("Picture", child_id))?;
        child.updated_at = Utc::now();
        tx.put_child(&child)?;
        if let Err(e) = tx.delete_picture(&reference) {
            warn!("Not deleting picture {} of child {}: {:#}", reference, child_id, e);
        }
        tx.commit()?;

        info!("Removed picture of child {}", child_id);
        Ok(ChildResult {
            child,
            success_message: "Picture deleted successfully".to_string(),
        })
    }

    fn validate_name(name: &str) -> DomainResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Child name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Child name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(trimmed.to_string())
    }

    fn parse_birthday(birthday: &str) -> DomainResult<NaiveDate> {
        let date = NaiveDate::parse_from_str(birthday.trim(), "%Y-%m-%d").map_err(|_| {
            DomainError::validation(format!("Invalid birthday '{}', expected YYYY-MM-DD", birthday))
        })?;

        if date > Utc::now().date_naive() {
            return Err(DomainError::validation("Birthday cannot be in the future"));
        }
        Ok(date)
    }
}
