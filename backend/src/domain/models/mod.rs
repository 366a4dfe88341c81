//! Domain models for the chore tracker.

pub mod guardian;
pub mod child;
pub mod task;
pub mod reward;
pub mod history;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a record ID of the form `<kind>::<epoch_millis>::<suffix>`.
///
/// The millisecond timestamp keeps IDs roughly sortable; the random suffix
/// keeps two records created in the same millisecond apart.
pub fn generate_id(kind: &str, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}::{}::{}", kind, now.timestamp_millis(), &suffix[..8])
}
