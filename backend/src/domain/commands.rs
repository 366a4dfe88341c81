//! Domain-level command and query types.
//!
//! Services take and return these; they are not part of the public API. The
//! REST layer maps the DTOs from the `shared` crate onto them.

pub mod identity {
    use crate::domain::models::guardian::{Guardian, Session};

    /// Input for creating a guardian account.
    #[derive(Debug, Clone)]
    pub struct RegisterGuardianCommand {
        pub email: String,
        pub password: String,
        pub display_name: String,
    }

    #[derive(Debug, Clone)]
    pub struct SignInCommand {
        pub email: String,
        pub password: String,
    }

    /// Result of a successful sign in.
    #[derive(Debug, Clone)]
    pub struct SignInResult {
        pub session: Session,
        pub guardian: Guardian,
    }
}

pub mod child {
    use crate::domain::models::child::{Child, Gender};

    /// Input for creating a new child.
    #[derive(Debug, Clone)]
    pub struct CreateChildCommand {
        pub name: String,
        pub gender: Gender,
        /// YYYY-MM-DD
        pub birthday: String,
    }

    /// Input for updating a child; `None` leaves a field unchanged.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateChildCommand {
        pub child_id: String,
        pub name: Option<String>,
        pub gender: Option<Gender>,
        pub birthday: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct ChildResult {
        pub child: Child,
        pub success_message: String,
    }

    /// Result of deleting a child and everything that referenced it.
    #[derive(Debug, Clone)]
    pub struct DeleteChildResult {
        pub child: Child,
        pub removed_tasks: usize,
        pub updated_rewards: usize,
        /// Rewards deleted because the child was the only one eligible
        pub removed_rewards: usize,
        pub success_message: String,
    }

    /// Input for uploading a profile picture.
    #[derive(Debug, Clone)]
    pub struct UploadPictureCommand {
        pub child_id: String,
        pub content_type: String,
        pub bytes: Vec<u8>,
    }
}

pub mod task {
    use crate::domain::models::child::Child;
    use crate::domain::models::history::HistoryEntry;
    use crate::domain::models::task::{Task, TaskStatus};

    #[derive(Debug, Clone)]
    pub struct CreateTaskCommand {
        pub title: String,
        pub description: Option<String>,
        pub points: u32,
        pub child_id: String,
    }

    /// Input for editing a task; `description: Some("")` clears it.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateTaskCommand {
        pub task_id: String,
        pub title: Option<String>,
        pub description: Option<String>,
        pub points: Option<u32>,
        pub child_id: Option<String>,
    }

    /// Query parameters for listing tasks.
    #[derive(Debug, Clone, Default)]
    pub struct TaskListQuery {
        pub child_id: Option<String>,
        pub status: Option<TaskStatus>,
    }

    #[derive(Debug, Clone)]
    pub struct TaskResult {
        pub task: Task,
        pub success_message: String,
    }

    /// Result of moving a task forward. Completing a task also reports the
    /// credited child and the ledger entry.
    #[derive(Debug, Clone)]
    pub struct TaskTransitionResult {
        pub task: Task,
        pub award: Option<TaskAward>,
        pub success_message: String,
    }

    #[derive(Debug, Clone)]
    pub struct TaskAward {
        pub child: Child,
        pub history_entry: HistoryEntry,
    }
}

pub mod reward {
    use crate::domain::models::child::Child;
    use crate::domain::models::history::HistoryEntry;
    use crate::domain::models::reward::Reward;

    #[derive(Debug, Clone)]
    pub struct CreateRewardCommand {
        pub title: String,
        pub cost: u32,
        pub icon: String,
        pub inventory: u32,
        pub eligible_children: Vec<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateRewardCommand {
        pub reward_id: String,
        pub title: Option<String>,
        pub cost: Option<u32>,
        pub icon: Option<String>,
        pub inventory: Option<u32>,
        pub eligible_children: Option<Vec<String>>,
    }

    #[derive(Debug, Clone)]
    pub struct RewardResult {
        pub reward: Reward,
        pub success_message: String,
    }

    /// Input for buying one unit of a reward.
    #[derive(Debug, Clone)]
    pub struct PurchaseRewardCommand {
        pub reward_id: String,
        pub child_id: String,
    }

    /// Everything a purchase changed.
    #[derive(Debug, Clone)]
    pub struct PurchaseRewardResult {
        pub child: Child,
        pub reward: Reward,
        pub owned_count: u32,
        pub history_entry: HistoryEntry,
        pub success_message: String,
    }
}

pub mod history {
    use crate::domain::models::child::Child;
    use crate::domain::models::history::{HistoryEntry, PointAction};

    /// Input for a manual point adjustment.
    #[derive(Debug, Clone)]
    pub struct AdjustPointsCommand {
        pub child_id: String,
        pub title: String,
        pub points: u32,
        pub action: PointAction,
    }

    #[derive(Debug, Clone)]
    pub struct AdjustPointsResult {
        pub child: Child,
        pub history_entry: HistoryEntry,
        pub success_message: String,
    }

    #[derive(Debug, Clone)]
    pub struct MarkPurchasedResult {
        pub entry: HistoryEntry,
        pub success_message: String,
    }

    /// A child's balance next to the signed sum of its ledger.
    #[derive(Debug, Clone, PartialEq)]
    pub struct BalanceAudit {
        pub child_id: String,
        pub balance: u32,
        pub ledger_total: i64,
        pub consistent: bool,
    }
}
