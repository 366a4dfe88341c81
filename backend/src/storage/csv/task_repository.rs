//! # Task Repository
//!
//! All of a guardian's chores live in one file, `tasks.csv`, in the guardian
//! directory.
//!
//! ## CSV Format
//!
//! ```csv
//! id,title,description,points,child_id,status,created_at,updated_at
//! task::1737367200000::3fa2c9d1,Dishes,After dinner,20,child::1737300000000::9b0e1f2a,pending,2025-01-20T10:00:00+00:00,2025-01-20T10:00:00+00:00
//! ```
//!
//! An empty `description` column means no description.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{Reader, Writer};
use log::warn;
use serde::{Deserialize, Serialize};

use super::connection::CsvConnection;
use super::write_batch::WriteBatch;
use crate::domain::models::task::{Task, TaskStatus};
use crate::storage::traits::TaskStorage;

/// CSV record structure for tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRecord {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    points: u32,
    child_id: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        TaskRecord {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            points: task.points,
            child_id: task.child_id.clone(),
            status: task.status.as_str().to_string(),
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid {} '{}'", field, value))?
        .with_timezone(&Utc))
}

impl TryFrom<TaskRecord> for Task {
    type Error = anyhow::Error;

    fn try_from(record: TaskRecord) -> Result<Self> {
        let status = TaskStatus::from_string(&record.status).map_err(|e| anyhow!(e))?;
        let description = if record.description.is_empty() {
            None
        } else {
            Some(record.description)
        };

        Ok(Task {
            created_at: parse_timestamp("created_at", &record.created_at)?,
            updated_at: parse_timestamp("updated_at", &record.updated_at)?,
            id: record.id,
            title: record.title,
            description,
            points: record.points,
            child_id: record.child_id,
            status,
        })
    }
}

#[derive(Clone)]
pub struct TaskRepository {
    connection: CsvConnection,
}

impl TaskRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read every task in file order
    pub(crate) fn load_tasks(&self, batch: &WriteBatch, guardian_id: &str) -> Result<Vec<Task>> {
        let path = self.connection.tasks_file_path(guardian_id);
        let Some(content) = batch.read_to_string(&path)? else {
            return Ok(Vec::new());
        };

        let mut reader = Reader::from_reader(content.as_bytes());
        let mut tasks = Vec::new();
        for result in reader.deserialize::<TaskRecord>() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Failed to read task row in {}: {}. Skipping.", path.display(), e);
                    continue;
                }
            };
            match Task::try_from(record) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!("Failed to parse task record: {}. Skipping.", e),
            }
        }
        Ok(tasks)
    }

    pub(crate) fn stage_tasks(&self, batch: &mut WriteBatch, guardian_id: &str, tasks: &[Task]) -> Result<()> {
        let mut writer = Writer::from_writer(Vec::new());
        for task in tasks {
            writer.serialize(TaskRecord::from(task))?;
        }
        let content = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to encode tasks CSV: {}", e.error()))?;

        batch.put(self.connection.tasks_file_path(guardian_id), content);
        Ok(())
    }

    /// Insert or replace a single task
    pub(crate) fn stage_task(&self, batch: &mut WriteBatch, guardian_id: &str, task: &Task) -> Result<()> {
        let mut tasks = self.load_tasks(batch, guardian_id)?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => tasks.push(task.clone()),
        }
        self.stage_tasks(batch, guardian_id, &tasks)
    }

    /// Returns true if the task existed
    pub(crate) fn stage_delete_task(&self, batch: &mut WriteBatch, guardian_id: &str, task_id: &str) -> Result<bool> {
        let mut tasks = self.load_tasks(batch, guardian_id)?;
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Ok(false);
        }
        self.stage_tasks(batch, guardian_id, &tasks)?;
        Ok(true)
    }

    /// Drop every task assigned to a child, returning how many were removed
    pub(crate) fn stage_delete_tasks_for_child(
        &self,
        batch: &mut WriteBatch,
        guardian_id: &str,
        child_id: &str,
    ) -> Result<usize> {
        let mut tasks = self.load_tasks(batch, guardian_id)?;
        let before = tasks.len();
        tasks.retain(|t| t.child_id != child_id);
        let removed = before - tasks.len();
        if removed > 0 {
            self.stage_tasks(batch, guardian_id, &tasks)?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl TaskStorage for TaskRepository {
    async fn get_task(&self, guardian_id: &str, task_id: &str) -> Result<Option<Task>> {
        let tasks = self.load_tasks(&WriteBatch::new(), guardian_id)?;
        Ok(tasks.into_iter().find(|t| t.id == task_id))
    }

    async fn list_tasks(
        &self,
        guardian_id: &str,
        child_id: Option<&str>,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .load_tasks(&WriteBatch::new(), guardian_id)?
            .into_iter()
            .filter(|t| child_id.map_or(true, |id| t.child_id == id))
            .filter(|t| status.map_or(true, |s| t.status == s))
            .collect();

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{sample_task, TestEnvironment, GUARDIAN_ID};
    use chrono::Duration;

    #[tokio::test]
    async fn test_store_and_get_task() {
        let env = TestEnvironment::new().unwrap();
        let repo = TaskRepository::new(env.connection.clone());
        let mut task = sample_task("Dishes", 20, "child::1::a");
        task.description = Some("After dinner, every day".to_string());

        let mut batch = WriteBatch::new();
        repo.stage_task(&mut batch, GUARDIAN_ID, &task).unwrap();
        batch.commit().unwrap();

        let loaded = repo.get_task(GUARDIAN_ID, &task.id).await.unwrap().unwrap();
        assert_eq!(loaded, task);
    }

    #[tokio::test]
    async fn test_missing_description_round_trips_as_none() {
        let env = TestEnvironment::new().unwrap();
        let repo = TaskRepository::new(env.connection.clone());
        let task = sample_task("Homework", 5, "child::1::a");

        let mut batch = WriteBatch::new();
        repo.stage_task(&mut batch, GUARDIAN_ID, &task).unwrap();
        batch.commit().unwrap();

        let loaded = repo.get_task(GUARDIAN_ID, &task.id).await.unwrap().unwrap();
        assert_eq!(loaded.description, None);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let env = TestEnvironment::new().unwrap();
        let repo = TaskRepository::new(env.connection.clone());

        let mut older = sample_task("Dishes", 20, "child::1::a");
        older.created_at = older.created_at - Duration::hours(1);
        let mut newer = sample_task("Laundry", 10, "child::1::a");
        newer.status = TaskStatus::Ongoing;
        let other = sample_task("Homework", 5, "child::2::b");

        let mut batch = WriteBatch::new();
        for task in [&older, &newer, &other] {
            repo.stage_task(&mut batch, GUARDIAN_ID, task).unwrap();
        }
        batch.commit().unwrap();

        let all = repo.list_tasks(GUARDIAN_ID, None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let for_child = repo.list_tasks(GUARDIAN_ID, Some("child::1::a"), None).await.unwrap();
        let titles: Vec<&str> = for_child.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Laundry", "Dishes"]);

        let ongoing = repo
            .list_tasks(GUARDIAN_ID, Some("child::1::a"), Some(TaskStatus::Ongoing))
            .await
            .unwrap();
        assert_eq!(ongoing.len(), 1);
        assert_eq!(ongoing[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_delete_tasks_for_child() {
        let env = TestEnvironment::new().unwrap();
        let repo = TaskRepository::new(env.connection.clone());

        let mut batch = WriteBatch::new();
        repo.stage_task(&mut batch, GUARDIAN_ID, &sample_task("A", 1, "child::1::a")).unwrap();
        repo.stage_task(&mut batch, GUARDIAN_ID, &sample_task("B", 1, "child::1::a")).unwrap();
        let keep = sample_task("C", 1, "child::2::b");
        repo.stage_task(&mut batch, GUARDIAN_ID, &keep).unwrap();
        batch.commit().unwrap();

        let mut batch = WriteBatch::new();
        let removed = repo
            .stage_delete_tasks_for_child(&mut batch, GUARDIAN_ID, "child::1::a")
            .unwrap();
        assert_eq!(removed, 2);
        assert!(!repo.stage_delete_task(&mut batch, GUARDIAN_ID, "task::9::z").unwrap());
        batch.commit().unwrap();

        let remaining = repo.list_tasks(GUARDIAN_ID, None, None).await.unwrap();
        assert_eq!(remaining, vec![keep]);
    }
}
