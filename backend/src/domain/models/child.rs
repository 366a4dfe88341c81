use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
}

/// Domain model representing a child profile owned by a guardian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub birthday: NaiveDate,
    /// Reference into the picture store
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub points: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Child {
    pub fn generate_id(now: DateTime<Utc>) -> String {
        super::generate_id("child", now)
    }

    /// Add points to the balance
    pub fn credit(&mut self, points: u32) -> Result<(), DomainError> {
        self.points = self.points.checked_add(points).ok_or_else(|| {
            DomainError::Validation(format!("Point balance of {} would overflow", self.name))
        })?;
        Ok(())
    }

    /// Remove points from the balance; the balance never goes below zero
    pub fn debit(&mut self, points: u32) -> Result<(), DomainError> {
        if self.points < points {
            return Err(DomainError::InsufficientPoints {
                required: points,
                available: self.points,
            });
        }
        self.points -= points;
        Ok(())
    }
}
