use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointAction {
    Add,
    Subtract,
}

impl PointAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointAction::Add => "add",
            PointAction::Subtract => "subtract",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(PointAction::Add),
            "subtract" => Ok(PointAction::Subtract),
            _ => Err(format!("Invalid point action: {}", s)),
        }
    }
}

/// One line of a child's point ledger. Only `purchased` ever changes after
/// the entry is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub points: u32,
    pub action: PointAction,
    pub date_completed: DateTime<Utc>,
    pub purchased: bool,
}

impl HistoryEntry {
    pub fn new(title: &str, points: u32, action: PointAction, now: DateTime<Utc>) -> Self {
        Self {
            id: super::generate_id("history", now),
            title: title.to_string(),
            points,
            action,
            date_completed: now,
            purchased: false,
        }
    }

    /// Signed point change
    pub fn delta(&self) -> i64 {
        match self.action {
            PointAction::Add => i64::from(self.points),
            PointAction::Subtract => -i64::from(self.points),
        }
    }
}

/// Signed sum of a ledger
pub fn ledger_total(entries: &[HistoryEntry]) -> i64 {
    entries.iter().map(HistoryEntry::delta).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_total() {
        let now = Utc::now();
        let entries = vec![
            HistoryEntry::new("Dishes", 100, PointAction::Add, now),
            HistoryEntry::new("Ice cream", 40, PointAction::Subtract, now),
            HistoryEntry::new("Homework", 5, PointAction::Add, now),
        ];
        assert_eq!(entries[1].delta(), -40);
        assert_eq!(ledger_total(&entries), 65);
        assert_eq!(ledger_total(&[]), 0);
    }
}
