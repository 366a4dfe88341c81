//! Chores and their status workflow.
//!
//! A task moves strictly forward: pending → ongoing → confirmation →
//! completed. The child accepts and submits; the guardian completes, which
//! credits the task's points to the child and appends an `add` entry to the
//! child's history in the same store transaction.

use chrono::Utc;
use log::{info, warn};

use crate::domain::commands::task::{
    CreateTaskCommand, TaskAward, TaskListQuery, TaskResult, TaskTransitionResult, UpdateTaskCommand,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::history::{HistoryEntry, PointAction};
use crate::domain::models::task::{Task, TaskStatus};
use crate::storage::csv::{CsvConnection, TaskRepository};
use crate::storage::{StoreTransaction, TaskStorage};

const MAX_TITLE_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 500;

#[derive(Clone)]
pub struct TaskService {
    connection: CsvConnection,
    tasks: TaskRepository,
}

impl TaskService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            tasks: TaskRepository::new(connection.clone()),
            connection,
        }
    }

    pub async fn create_task(&self, guardian_id: &str, command: CreateTaskCommand) -> DomainResult<TaskResult> {
        info!("Creating task '{}' for child {}", command.title, command.child_id);

        let title = Self::validate_title(&command.title)?;
        let description = Self::validate_description(command.description.as_deref())?;
        Self::validate_points(command.points)?;

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        if tx.get_child(&command.child_id)?.is_none() {
            return Err(DomainError::not_found("Child", &command.child_id));
        }

        let now = Utc::now();
        let task = Task {
            id: Task::generate_id(now),
            title,
            description,
            points: command.points,
            child_id: command.child_id,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tx.put_task(&task)?;
        tx.commit()?;

        info!("Created task {} worth {} points", task.id, task.points);
        Ok(TaskResult {
            task,
            success_message: "Task created successfully".to_string(),
        })
    }

    pub async fn get_task(&self, guardian_id: &str, task_id: &str) -> DomainResult<Task> {
        self.tasks
            .get_task(guardian_id, task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task", task_id))
    }

    /// List tasks newest first, optionally filtered by child and status
    pub async fn list_tasks(&self, guardian_id: &str, query: TaskListQuery) -> DomainResult<Vec<Task>> {
        let tasks = self
            .tasks
            .list_tasks(guardian_id, query.child_id.as_deref(), query.status)
            .await?;
        info!("Found {} tasks for guardian {}", tasks.len(), guardian_id);
        Ok(tasks)
    }

    pub async fn update_task(&self, guardian_id: &str, command: UpdateTaskCommand) -> DomainResult<TaskResult> {
        info!("Updating task: {}", command.task_id);

        let title = command.title.as_deref().map(Self::validate_title).transpose()?;
        if let Some(points) = command.points {
            Self::validate_points(points)?;
        }

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut task = tx
            .get_task(&command.task_id)?
            .ok_or_else(|| DomainError::not_found("Task", &command.task_id))?;

        if task.status.is_terminal() && (command.points.is_some() || command.child_id.is_some()) {
            return Err(DomainError::validation(
                "Points and assignment of a completed task can no longer change",
            ));
        }

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = command.description {
            task.description = Self::validate_description(Some(&description))?;
        }
        if let Some(points) = command.points {
            task.points = points;
        }
        if let Some(child_id) = command.child_id {
            if tx.get_child(&child_id)?.is_none() {
                return Err(DomainError::not_found("Child", &child_id));
            }
            task.child_id = child_id;
        }
        task.updated_at = Utc::now();

        tx.put_task(&task)?;
        tx.commit()?;

        Ok(TaskResult {
            task,
            success_message: "Task updated successfully".to_string(),
        })
    }

    /// Delete a task. Points already awarded stay with the child.
    pub async fn delete_task(&self, guardian_id: &str, task_id: &str) -> DomainResult<Task> {
        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let task = tx
            .get_task(task_id)?
            .ok_or_else(|| DomainError::not_found("Task", task_id))?;
        tx.delete_task(task_id)?;
        tx.commit()?;

        info!("Deleted task {}", task_id);
        Ok(task)
    }

    /// Child takes on a pending task
    pub async fn accept_task(&self, guardian_id: &str, task_id: &str) -> DomainResult<TaskTransitionResult> {
        self.transition(guardian_id, task_id, TaskStatus::Ongoing).await
    }

    /// Child reports the task as done
    pub async fn submit_task(&self, guardian_id: &str, task_id: &str) -> DomainResult<TaskTransitionResult> {
        self.transition(guardian_id, task_id, TaskStatus::Confirmation).await
    }

    /// Guardian confirms the work and the child is paid
    pub async fn complete_task(&self, guardian_id: &str, task_id: &str) -> DomainResult<TaskTransitionResult> {
        self.transition(guardian_id, task_id, TaskStatus::Completed).await
    }

    pub async fn set_status(
        &self,
        guardian_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> DomainResult<TaskTransitionResult> {
        self.transition(guardian_id, task_id, status).await
    }

    async fn transition(&self, guardian_id: &str, task_id: &str, to: TaskStatus) -> DomainResult<TaskTransitionResult> {
        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut task = tx
            .get_task(task_id)?
            .ok_or_else(|| DomainError::not_found("Task", task_id))?;

        if !task.status.can_transition_to(to) {
            warn!("Rejected transition of task {} from {} to {}", task_id, task.status, to);
            return Err(DomainError::InvalidTransition { from: task.status, to });
        }

        let now = Utc::now();
        task.status = to;
        task.updated_at = now;
        tx.put_task(&task)?;

        let award = if to == TaskStatus::Completed {
            let mut child = tx
                .get_child(&task.child_id)?
                .ok_or_else(|| DomainError::not_found("Child", &task.child_id))?;
            child.credit(task.points)?;
            child.updated_at = now;

            let history_entry = HistoryEntry::new(&task.title, task.points, PointAction::Add, now);
            tx.put_child(&child)?;
            tx.append_history(&child.id, &history_entry)?;
            Some(TaskAward { child, history_entry })
        } else {
            None
        };

        tx.commit()?;

        let success_message = match &award {
            Some(award) => format!(
                "Task completed, {} points awarded to {}",
                task.points, award.child.name
            ),
            None => format!("Task moved to {}", to),
        };
        info!("Task {} is now {}", task.id, to);

        Ok(TaskTransitionResult {
            task,
            award,
            success_message,
        })
    }

    fn validate_title(title: &str) -> DomainResult<String> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Task title cannot be empty"));
        }
        if trimmed.chars().count() > MAX_TITLE_LENGTH {
            return Err(DomainError::validation(format!(
                "Task title cannot exceed {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Blank descriptions are stored as none
    fn validate_description(description: Option<&str>) -> DomainResult<Option<String>> {
        let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(None);
        };
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(DomainError::validation(format!(
                "Task description cannot exceed {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }
        Ok(Some(description.to_string()))
    }

    fn validate_points(points: u32) -> DomainResult<()> {
        if points == 0 {
            return Err(DomainError::validation("Task points must be greater than zero"));
        }
        Ok(())
    }
}
