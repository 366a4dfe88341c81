//! Shared fixtures for storage tests.
//!
//! Each [`TestEnvironment`] owns a temporary data directory that is removed
//! when the environment is dropped, even if the test panics.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::CsvConnection;
use crate::domain::models::child::{Child, Gender};
use crate::domain::models::reward::Reward;
use crate::domain::models::task::{Task, TaskStatus};

/// Guardian that owns the fixtures below
pub const GUARDIAN_ID: &str = "guardian::1700000000000::0a1b2c3d";

pub struct TestEnvironment {
    /// Kept alive so the directory survives until drop
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }
}

pub fn sample_child(name: &str, points: u32) -> Child {
    let now = Utc::now();
    Child {
        id: Child::generate_id(now),
        name: name.to_string(),
        gender: Gender::Girl,
        birthday: NaiveDate::from_ymd_opt(2016, 4, 2).unwrap(),
        picture: None,
        points,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_task(title: &str, points: u32, child_id: &str) -> Task {
    let now = Utc::now();
    Task {
        id: Task::generate_id(now),
        title: title.to_string(),
        description: None,
        points,
        child_id: child_id.to_string(),
        status: TaskStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_reward(title: &str, cost: u32, inventory: u32, eligible_children: &[&str]) -> Reward {
    let now = Utc::now();
    Reward {
        id: Reward::generate_id(now),
        title: title.to_string(),
        cost,
        icon: "🍦".to_string(),
        inventory,
        eligible_children: eligible_children.iter().map(|id| id.to_string()).collect(),
        created_at: now,
    }
}
