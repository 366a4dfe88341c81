//! Point ledger: listing, manual adjustments, claiming purchases and auditing
//! a balance against the ledger.

use chrono::Utc;
use log::{info, warn};

use crate::domain::commands::history::{AdjustPointsCommand, AdjustPointsResult, BalanceAudit, MarkPurchasedResult};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::child::Child;
use crate::domain::models::history::{ledger_total, HistoryEntry, PointAction};
use crate::storage::csv::{ChildRepository, CsvConnection, HistoryRepository};
use crate::storage::{ChildStorage, HistoryStorage, StoreTransaction};

const MAX_TITLE_LENGTH: usize = 100;

#[derive(Clone)]
pub struct HistoryService {
    connection: CsvConnection,
    children: ChildRepository,
    history: HistoryRepository,
}

impl HistoryService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            children: ChildRepository::new(connection.clone()),
            history: HistoryRepository::new(connection.clone()),
            connection,
        }
    }

    /// A child's history, newest first
    pub async fn list_history(&self, guardian_id: &str, child_id: &str) -> DomainResult<Vec<HistoryEntry>> {
        self.ensure_child(guardian_id, child_id).await?;
        let entries = self.history.list_history(guardian_id, child_id).await?;
        info!("Found {} history entries for child {}", entries.len(), child_id);
        Ok(entries)
    }

    /// Add or subtract points by hand
    pub async fn adjust_points(&self, guardian_id: &str, command: AdjustPointsCommand) -> DomainResult<AdjustPointsResult> {
        info!(
            "Adjusting points of child {}: {} {} ({})",
            command.child_id,
            command.action.as_str(),
            command.points,
            command.title
        );

        let title = command.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("Activity title cannot be empty"));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(DomainError::validation(format!(
                "Activity title cannot exceed {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if command.points == 0 {
            return Err(DomainError::validation("Points must be greater than zero"));
        }

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut child = tx
            .get_child(&command.child_id)?
            .ok_or_else(|| DomainError::not_found("Child", &command.child_id))?;

        match command.action {
            PointAction::Add => child.credit(command.points)?,
            PointAction::Subtract => child.debit(command.points)?,
        }

        let now = Utc::now();
        child.updated_at = now;
        let history_entry = HistoryEntry::new(title, command.points, command.action, now);
        tx.put_child(&child)?;
        tx.append_history(&child.id, &history_entry)?;
        tx.commit()?;

        info!("Child {} now has {} points", child.id, child.points);
        Ok(AdjustPointsResult {
            success_message: format!("{} now has {} points", child.name, child.points),
            child,
            history_entry,
        })
    }

    /// Mark a purchase as handed over to the child.
    /// Marking an entry that is already purchased changes nothing.
    pub async fn mark_purchased(
        &self,
        guardian_id: &str,
        child_id: &str,
        entry_id: &str,
    ) -> DomainResult<MarkPurchasedResult> {
        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        if tx.get_child(child_id)?.is_none() {
            return Err(DomainError::not_found("Child", child_id));
        }

        let mut entry = tx
            .list_history(child_id)?
            .into_iter()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| DomainError::not_found("History entry", entry_id))?;

        if entry.action != PointAction::Subtract {
            return Err(DomainError::validation("Only purchases can be marked as purchased"));
        }
        if entry.purchased {
            info!("History entry {} was already marked as purchased", entry_id);
            return Ok(MarkPurchasedResult {
                entry,
                success_message: "Already marked as purchased".to_string(),
            });
        }

        entry.purchased = true;
        tx.put_history_entry(child_id, &entry)?;
        tx.commit()?;

        info!("Marked history entry {} as purchased", entry_id);
        Ok(MarkPurchasedResult {
            entry,
            success_message: "Marked as purchased".to_string(),
        })
    }

    /// Compare the stored balance with the signed sum of the ledger
    pub async fn audit_balance(&self, guardian_id: &str, child_id: &str) -> DomainResult<BalanceAudit> {
        let child = self.ensure_child(guardian_id, child_id).await?;
        let entries = self.history.list_history(guardian_id, child_id).await?;
        let total = ledger_total(&entries);
        let consistent = total == i64::from(child.points);

        if !consistent {
            warn!(
                "Balance of child {} is {} but its history sums to {}",
                child_id, child.points, total
            );
        }
        Ok(BalanceAudit {
            child_id: child.id,
            balance: child.points,
            ledger_total: total,
            consistent,
        })
    }

    async fn ensure_child(&self, guardian_id: &str, child_id: &str) -> DomainResult<Child> {
        self.children
            .get_child(guardian_id, child_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Child", child_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::reward::{CreateRewardCommand, PurchaseRewardCommand};
    use crate::domain::commands::task::CreateTaskCommand;
    use crate::domain::reward_service::RewardService;
    use crate::domain::task_service::TaskService;
    use crate::storage::csv::test_utils::{sample_child, TestEnvironment, GUARDIAN_ID};

    async fn seed_child(env: &TestEnvironment) -> Child {
        let child = sample_child("Emma", 0);
        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        tx.put_child(&child).unwrap();
        tx.commit().unwrap();
        child
    }

    fn adjust(child: &Child, title: &str, points: u32, action: PointAction) -> AdjustPointsCommand {
        AdjustPointsCommand {
            child_id: child.id.clone(),
            title: title.to_string(),
            points,
            action,
        }
    }

    #[tokio::test]
    async fn test_adjust_points_updates_balance_and_ledger() {
        let env = TestEnvironment::new().unwrap();
        let history = HistoryService::new(env.connection.clone());
        let child = seed_child(&env).await;

        let added = history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Helped grandma", 30, PointAction::Add))
            .await
            .unwrap();
        assert_eq!(added.child.points, 30);

        let subtracted = history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Broke a glass", 5, PointAction::Subtract))
            .await
            .unwrap();
        assert_eq!(subtracted.child.points, 25);
        assert_eq!(subtracted.history_entry.delta(), -5);

        let entries = history.list_history(GUARDIAN_ID, &child.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Broke a glass");
    }

    #[tokio::test]
    async fn test_adjust_points_never_goes_negative() {
        let env = TestEnvironment::new().unwrap();
        let history = HistoryService::new(env.connection.clone());
        let child = seed_child(&env).await;

        let err = history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Penalty", 5, PointAction::Subtract))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientPoints { .. }));
        assert!(history.list_history(GUARDIAN_ID, &child.id).await.unwrap().is_empty());

        assert!(history
            .adjust_points(GUARDIAN_ID, adjust(&child, " ", 5, PointAction::Add))
            .await
            .is_err());
        assert!(history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Bonus", 0, PointAction::Add))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_mark_purchased() {
        let env = TestEnvironment::new().unwrap();
        let history = HistoryService::new(env.connection.clone());
        let child = seed_child(&env).await;

        let earned = history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Bonus", 50, PointAction::Add))
            .await
            .unwrap()
            .history_entry;
        let spent = history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Ice cream", 40, PointAction::Subtract))
            .await
            .unwrap()
            .history_entry;

        let marked = history.mark_purchased(GUARDIAN_ID, &child.id, &spent.id).await.unwrap();
        assert!(marked.entry.purchased);

        // Marking twice is harmless
        let again = history.mark_purchased(GUARDIAN_ID, &child.id, &spent.id).await.unwrap();
        assert!(again.entry.purchased);

        assert!(matches!(
            history.mark_purchased(GUARDIAN_ID, &child.id, &earned.id).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            history.mark_purchased(GUARDIAN_ID, &child.id, "history::1::missing").await,
            Err(DomainError::NotFound { .. })
        ));

        let entries = history.list_history(GUARDIAN_ID, &child.id).await.unwrap();
        let stored = entries.iter().find(|e| e.id == spent.id).unwrap();
        assert!(stored.purchased);
        assert_eq!(stored.points, 40);
    }

    #[tokio::test]
    async fn test_audit_agrees_after_mixed_activity() {
        let env = TestEnvironment::new().unwrap();
        let history = HistoryService::new(env.connection.clone());
        let tasks = TaskService::new(env.connection.clone());
        let rewards = RewardService::new(env.connection.clone());
        let child = seed_child(&env).await;

        history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Bonus", 100, PointAction::Add))
            .await
            .unwrap();

        let task = tasks
            .create_task(
                GUARDIAN_ID,
                CreateTaskCommand {
                    title: "Dishes".to_string(),
                    description: None,
                    points: 15,
                    child_id: child.id.clone(),
                },
            )
            .await
            .unwrap()
            .task;
        tasks.accept_task(GUARDIAN_ID, &task.id).await.unwrap();
        tasks.submit_task(GUARDIAN_ID, &task.id).await.unwrap();
        tasks.complete_task(GUARDIAN_ID, &task.id).await.unwrap();

        let reward = rewards
            .create_reward(
                GUARDIAN_ID,
                CreateRewardCommand {
                    title: "Ice cream".to_string(),
                    cost: 40,
                    icon: "🍦".to_string(),
                    inventory: 3,
                    eligible_children: vec![child.id.clone()],
                },
            )
            .await
            .unwrap()
            .reward;
        rewards
            .purchase_reward(
                GUARDIAN_ID,
                PurchaseRewardCommand {
                    reward_id: reward.id.clone(),
                    child_id: child.id.clone(),
                },
            )
            .await
            .unwrap();
        history
            .adjust_points(GUARDIAN_ID, adjust(&child, "Penalty", 5, PointAction::Subtract))
            .await
            .unwrap();

        let audit = history.audit_balance(GUARDIAN_ID, &child.id).await.unwrap();
        assert_eq!(
            audit,
            BalanceAudit {
                child_id: child.id.clone(),
                balance: 70,
                ledger_total: 70,
                consistent: true,
            }
        );
    }

    #[tokio::test]
    async fn test_audit_reports_drift() {
        let env = TestEnvironment::new().unwrap();
        let history = HistoryService::new(env.connection.clone());

        // Balance set outside the service, with no ledger behind it
        let mut child = sample_child("Emma", 0);
        child.points = 12;
        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        tx.put_child(&child).unwrap();
        tx.commit().unwrap();

        let audit = history.audit_balance(GUARDIAN_ID, &child.id).await.unwrap();
        assert_eq!(audit.balance, 12);
        assert_eq!(audit.ledger_total, 0);
        assert!(!audit.consistent);
    }
}
