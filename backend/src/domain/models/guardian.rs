use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parent account. Owns children, tasks and rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    pub id: String,
    /// Stored lowercased and trimmed, see [`Guardian::normalize_email`]
    pub email: String,
    pub display_name: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Guardian {
    pub fn generate_id(now: DateTime<Utc>) -> String {
        super::generate_id("guardian", now)
    }

    /// Emails compare case-insensitively
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

/// A signed-in guardian session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub guardian_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
