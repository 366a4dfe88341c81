//! # History Repository
//!
//! Per-child point ledger stored in `{child_directory}/history.csv`.
//!
//! ## CSV Format
//!
//! ```csv
//! id,title,points,action,date_completed,purchased
//! history::1737367200000::3fa2c9d1,Dishes,20,add,2025-01-20T10:00:00+00:00,false
//! history::1737453600000::9b0e1f2a,Ice cream,40,subtract,2025-01-21T10:00:00+00:00,false
//! ```
//!
//! Rows are kept in append order.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{Reader, Writer};
use log::warn;
use serde::{Deserialize, Serialize};

use super::connection::CsvConnection;
use super::write_batch::WriteBatch;
use crate::domain::models::history::{HistoryEntry, PointAction};
use crate::storage::traits::HistoryStorage;

/// CSV record structure for history entries
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryRecord {
    id: String,
    title: String,
    points: u32,
    action: String,
    date_completed: String,
    #[serde(default)]
    purchased: bool,
}

impl From<&HistoryEntry> for HistoryRecord {
    fn from(entry: &HistoryEntry) -> Self {
        HistoryRecord {
            id: entry.id.clone(),
            title: entry.title.clone(),
            points: entry.points,
            action: entry.action.as_str().to_string(),
            date_completed: entry.date_completed.to_rfc3339(),
            purchased: entry.purchased,
        }
    }
}

impl TryFrom<HistoryRecord> for HistoryEntry {
    type Error = anyhow::Error;

    fn try_from(record: HistoryRecord) -> Result<Self> {
        let action = PointAction::from_string(&record.action).map_err(|e| anyhow!(e))?;
        let date_completed = DateTime::parse_from_rfc3339(&record.date_completed)
            .with_context(|| format!("Invalid date_completed '{}'", record.date_completed))?
            .with_timezone(&Utc);

        Ok(HistoryEntry {
            id: record.id,
            title: record.title,
            points: record.points,
            action,
            date_completed,
            purchased: record.purchased,
        })
    }
}

#[derive(Clone)]
pub struct HistoryRepository {
    connection: CsvConnection,
}

impl HistoryRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read a child's ledger in append order
    pub(crate) fn load_entries(
        &self,
        batch: &WriteBatch,
        guardian_id: &str,
        child_id: &str,
    ) -> Result<Vec<HistoryEntry>> {
        let path = self.connection.history_file_path(guardian_id, child_id);
        let Some(content) = batch.read_to_string(&path)? else {
            return Ok(Vec::new());
        };

        let mut reader = Reader::from_reader(content.as_bytes());
        let mut entries = Vec::new();
        for result in reader.deserialize::<HistoryRecord>() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Failed to read history row in {}: {}. Skipping.", path.display(), e);
                    continue;
                }
            };
            match HistoryEntry::try_from(record) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Failed to parse history record: {}. Skipping.", e),
            }
        }
        Ok(entries)
    }

    /// Stage the full ledger of a child
    pub(crate) fn stage_entries(
        &self,
        batch: &mut WriteBatch,
        guardian_id: &str,
        child_id: &str,
        entries: &[HistoryEntry],
    ) -> Result<()> {
        let mut writer = Writer::from_writer(Vec::new());
        for entry in entries {
            writer.serialize(HistoryRecord::from(entry))?;
        }
        let content = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to encode history CSV: {}", e.error()))?;

        batch.put(self.connection.history_file_path(guardian_id, child_id), content);
        Ok(())
    }

    /// Stage one more entry at the end of the ledger
    pub(crate) fn stage_append(
        &self,
        batch: &mut WriteBatch,
        guardian_id: &str,
        child_id: &str,
        entry: &HistoryEntry,
    ) -> Result<()> {
        let mut entries = self.load_entries(batch, guardian_id, child_id)?;
        entries.push(entry.clone());
        self.stage_entries(batch, guardian_id, child_id, &entries)
    }
}

#[async_trait]
impl HistoryStorage for HistoryRepository {
    async fn list_history(&self, guardian_id: &str, child_id: &str) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.load_entries(&WriteBatch::new(), guardian_id, child_id)?;
        // Stable sort keeps append order for entries with equal timestamps
        entries.reverse();
        entries.sort_by(|a, b| b.date_completed.cmp(&a.date_completed));
        Ok(entries)
    }

    async fn get_history_entry(
        &self,
        guardian_id: &str,
        child_id: &str,
        entry_id: &str,
    ) -> Result<Option<HistoryEntry>> {
        let entries = self.load_entries(&WriteBatch::new(), guardian_id, child_id)?;
        Ok(entries.into_iter().find(|e| e.id == entry_id))
    }
}
