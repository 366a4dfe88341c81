use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a chore: pending → ongoing → confirmation → completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Ongoing,
    Confirmation,
    #[serde(alias = "finished")]
    Completed,
}

impl TaskStatus {
    /// Convert to string for CSV storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ongoing => "ongoing",
            TaskStatus::Confirmation => "confirmation",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parse from string for CSV loading
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "ongoing" => Ok(TaskStatus::Ongoing),
            "confirmation" => Ok(TaskStatus::Confirmation),
            "completed" | "finished" => Ok(TaskStatus::Completed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }

    /// The only status this one may move to
    pub fn next(&self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Pending => Some(TaskStatus::Ongoing),
            TaskStatus::Ongoing => Some(TaskStatus::Confirmation),
            TaskStatus::Confirmation => Some(TaskStatus::Completed),
            TaskStatus::Completed => None,
        }
    }

    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chore assigned to one child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub points: u32,
    pub child_id: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn generate_id(now: DateTime<Utc>) -> String {
        super::generate_id("task", now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_only_move_forward() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Ongoing));
        assert!(TaskStatus::Ongoing.can_transition_to(TaskStatus::Confirmation));
        assert!(TaskStatus::Confirmation.can_transition_to(TaskStatus::Completed));

        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Confirmation.can_transition_to(TaskStatus::Ongoing));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Ongoing.can_transition_to(TaskStatus::Ongoing));
        assert!(TaskStatus::Completed.is_terminal());
    }

    #[test]
    fn test_status_strings() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Ongoing,
            TaskStatus::Confirmation,
            TaskStatus::Completed,
        ] {
            assert_eq!(TaskStatus::from_string(status.as_str()), Ok(status));
        }
        assert_eq!(TaskStatus::from_string("Finished"), Ok(TaskStatus::Completed));
        assert!(TaskStatus::from_string("done").is_err());
    }
}
