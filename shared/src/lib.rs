use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Guardians and sessions
// ---------------------------------------------------------------------------

/// Guardian account as exposed over the API (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String, // RFC 3339 timestamp
}

/// Request for registering a new guardian account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterGuardianRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Request for signing in with email and password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Response after a successful sign in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Opaque bearer token to send as `Authorization: Bearer <token>`
    pub token: String,
    pub guardian: Guardian,
    pub expires_at: String, // RFC 3339 timestamp
}

/// The guardian behind the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentGuardianResponse {
    pub guardian: Guardian,
}

/// Request for updating the current guardian's display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGuardianRequest {
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub birthday: String, // ISO 8601 date format (YYYY-MM-DD)
    /// Reference into the picture store, if a picture was uploaded
    pub picture: Option<String>,
    pub points: u32,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Request for creating a new child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub gender: Gender,
    pub birthday: String, // ISO 8601 date format (YYYY-MM-DD)
}

/// Request for updating an existing child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChildRequest {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub birthday: Option<String>,
}

/// Response for a single child operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

/// Response for listing children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

/// Response after deleting a child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteChildResponse {
    pub success_message: String,
    /// Number of tasks that were assigned to the child and removed with it
    pub removed_tasks: usize,
    /// Rewards deleted because the child was the only one eligible for them
    pub removed_rewards: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointAction {
    Add,
    Subtract,
}

/// Request for manually adding or subtracting points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustPointsRequest {
    pub title: String,
    pub points: u32,
    pub action: PointAction,
}

/// Response after a point adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustPointsResponse {
    pub child: Child,
    pub history_entry: HistoryEntry,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Ongoing,
    Confirmation,
    /// `finished` is accepted as an older spelling of the terminal state
    #[serde(alias = "finished")]
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub points: u32,
    pub child_id: String,
    pub status: TaskStatus,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Request for creating a new task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub points: u32,
    pub child_id: String,
}

/// Request for updating an existing task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    /// `Some("")` clears the description
    pub description: Option<String>,
    pub points: Option<u32>,
    pub child_id: Option<String>,
}

/// Request for moving a task to another status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

/// Query for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskListRequest {
    pub child_id: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

/// Response after a guardian completes a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteTaskResponse {
    pub task: Task,
    pub child: Child,
    pub history_entry: HistoryEntry,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub cost: u32,
    pub icon: String,
    pub inventory: u32,
    pub eligible_children: Vec<String>,
    pub created_at: String, // RFC 3339 timestamp
}

/// Request for adding a reward to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRewardRequest {
    pub title: String,
    pub cost: u32,
    pub icon: String,
    pub inventory: u32,
    pub eligible_children: Vec<String>,
}

/// Request for editing a reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRewardRequest {
    pub title: Option<String>,
    pub cost: Option<u32>,
    pub icon: Option<String>,
    pub inventory: Option<u32>,
    pub eligible_children: Option<Vec<String>>,
}

/// Query for listing rewards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardListRequest {
    /// Only list rewards this child may purchase
    pub child_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardResponse {
    pub reward: Reward,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardListResponse {
    pub rewards: Vec<Reward>,
}

/// Request for purchasing a reward on behalf of a child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRewardRequest {
    pub child_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRewardResponse {
    pub child: Child,
    pub reward: Reward,
    pub owned_count: u32,
    pub history_entry: HistoryEntry,
    pub success_message: String,
}

/// How many of one reward a child owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedItem {
    pub reward_id: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedItemsResponse {
    pub child_id: String,
    pub items: Vec<OwnedItem>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    /// Magnitude of the change, always non-negative
    pub points: u32,
    pub action: PointAction,
    pub date_completed: String, // RFC 3339 timestamp
    pub purchased: bool,
}

impl HistoryEntry {
    /// Signed point change recorded by this entry
    pub fn delta(&self) -> i64 {
        match self.action {
            PointAction::Add => self.points as i64,
            PointAction::Subtract => -(self.points as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub child_id: String,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryResponse {
    pub entry: HistoryEntry,
    pub success_message: String,
}

/// Comparison of a child's balance against its ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAuditResponse {
    pub child_id: String,
    pub balance: u32,
    pub ledger_total: i64,
    pub consistent: bool,
}

// ---------------------------------------------------------------------------
// Errors and record identifiers
// ---------------------------------------------------------------------------

/// JSON body returned for every failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Record IDs have the form `<kind>::<epoch_millis>::<suffix>`,
/// e.g. `child::1702516122000::3fa2c9d1`.
pub fn parse_record_id(id: &str) -> Result<(String, u64), RecordIdError> {
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(RecordIdError::InvalidFormat);
    }

    let kind = parts[0];
    if !matches!(kind, "guardian" | "child" | "task" | "reward" | "history") {
        return Err(RecordIdError::InvalidKind);
    }

    let epoch_millis = parts[1]
        .parse::<u64>()
        .map_err(|_| RecordIdError::InvalidTimestamp)?;

    Ok((kind.to_string(), epoch_millis))
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordIdError {
    InvalidFormat,
    InvalidKind,
    InvalidTimestamp,
}

impl fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIdError::InvalidFormat => write!(f, "Invalid record ID format"),
            RecordIdError::InvalidKind => write!(f, "Invalid record kind in ID"),
            RecordIdError::InvalidTimestamp => write!(f, "Invalid timestamp in record ID"),
        }
    }
}

impl std::error::Error for RecordIdError {}
