use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A store item children can buy with points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub cost: u32,
    pub icon: String,
    /// Units left in stock; a purchase takes one
    pub inventory: u32,
    pub eligible_children: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Reward {
    pub fn generate_id(now: DateTime<Utc>) -> String {
        super::generate_id("reward", now)
    }

    pub fn is_eligible(&self, child_id: &str) -> bool {
        self.eligible_children.iter().any(|id| id == child_id)
    }

    pub fn is_sold_out(&self) -> bool {
        self.inventory == 0
    }
}

/// Number of units of a reward a child has bought
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedItem {
    pub reward_id: String,
    pub count: u32,
}
