//! Reward store: catalog management and purchases.
//!
//! ## Purchase
//!
//! Buying a reward checks, in order, that the child and the reward exist, that
//! the child is eligible, that the child can afford it and that there is stock
//! left. When every check passes, the child's balance, the reward's inventory,
//! the child's owned count and the child's history are all updated in one
//! store transaction. When any check fails nothing is written.

use chrono::Utc;
use log::{info, warn};
use std::collections::HashSet;

use crate::domain::commands::reward::{
    CreateRewardCommand, PurchaseRewardCommand, PurchaseRewardResult, RewardResult, UpdateRewardCommand,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::history::{HistoryEntry, PointAction};
use crate::domain::models::reward::{OwnedItem, Reward};
use crate::storage::csv::{ChildRepository, CsvConnection, OwnershipRepository, RewardRepository};
use crate::storage::{ChildStorage, OwnershipStorage, RewardStorage, StoreTransaction};

const MAX_TITLE_LENGTH: usize = 100;

#[derive(Clone)]
pub struct RewardService {
    connection: CsvConnection,
    rewards: RewardRepository,
    children: ChildRepository,
    ownership: OwnershipRepository,
}

impl RewardService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            rewards: RewardRepository::new(connection.clone()),
            children: ChildRepository::new(connection.clone()),
            ownership: OwnershipRepository::new(connection.clone()),
            connection,
        }
    }

    pub async fn create_reward(&self, guardian_id: &str, command: CreateRewardCommand) -> DomainResult<RewardResult> {
        info!("Creating reward '{}' costing {} points", command.title, command.cost);

        let title = Self::validate_title(&command.title)?;
        let icon = Self::validate_icon(&command.icon)?;
        Self::validate_cost(command.cost)?;
        let eligible_children = Self::dedup_children(command.eligible_children)?;

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        Self::check_children_exist(&tx, &eligible_children)?;

        let now = Utc::now();
        let reward = Reward {
            id: Reward::generate_id(now),
            title,
            cost: command.cost,
            icon,
            inventory: command.inventory,
            eligible_children,
            created_at: now,
        };
        tx.put_reward(&reward)?;
        tx.commit()?;

        info!("Created reward {} with {} in stock", reward.id, reward.inventory);
        Ok(RewardResult {
            reward,
            success_message: "Reward created successfully".to_string(),
        })
    }

    pub async fn get_reward(&self, guardian_id: &str, reward_id: &str) -> DomainResult<Reward> {
        self.rewards
            .get_reward(guardian_id, reward_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reward", reward_id))
    }

    /// List the catalog, or only what one child may buy
    pub async fn list_rewards(&self, guardian_id: &str, child_id: Option<&str>) -> DomainResult<Vec<Reward>> {
        let rewards = self.rewards.list_rewards(guardian_id).await?;
        let rewards: Vec<Reward> = match child_id {
            Some(child_id) => rewards.into_iter().filter(|r| r.is_eligible(child_id)).collect(),
            None => rewards,
        };
        info!("Found {} rewards for guardian {}", rewards.len(), guardian_id);
        Ok(rewards)
    }

    pub async fn update_reward(&self, guardian_id: &str, command: UpdateRewardCommand) -> DomainResult<RewardResult> {
        info!("Updating reward: {}", command.reward_id);

        let title = command.title.as_deref().map(Self::validate_title).transpose()?;
        let icon = command.icon.as_deref().map(Self::validate_icon).transpose()?;
        if let Some(cost) = command.cost {
            Self::validate_cost(cost)?;
        }
        let eligible_children = command
            .eligible_children
            .map(Self::dedup_children)
            .transpose()?;

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut reward = tx
            .get_reward(&command.reward_id)?
            .ok_or_else(|| DomainError::not_found("Reward", &command.reward_id))?;

        if let Some(title) = title {
            reward.title = title;
        }
        if let Some(icon) = icon {
            reward.icon = icon;
        }
        if let Some(cost) = command.cost {
            reward.cost = cost;
        }
        if let Some(inventory) = command.inventory {
            reward.inventory = inventory;
        }
        if let Some(eligible_children) = eligible_children {
            Self::check_children_exist(&tx, &eligible_children)?;
            reward.eligible_children = eligible_children;
        }
        if reward.eligible_children.is_empty() {
            return Err(DomainError::validation("A reward needs at least one eligible child"));
        }

        tx.put_reward(&reward)?;
        tx.commit()?;

        Ok(RewardResult {
            reward,
            success_message: "Reward updated successfully".to_string(),
        })
    }

    /// Remove a reward from the store. Units already bought stay owned.
    pub async fn delete_reward(&self, guardian_id: &str, reward_id: &str) -> DomainResult<Reward> {
        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let reward = tx
            .get_reward(reward_id)?
            .ok_or_else(|| DomainError::not_found("Reward", reward_id))?;
        tx.delete_reward(reward_id)?;
        tx.commit()?;

        info!("Deleted reward {}", reward_id);
        Ok(reward)
    }

    /// Buy one unit of a reward for a child
    pub async fn purchase_reward(
        &self,
        guardian_id: &str,
        command: PurchaseRewardCommand,
    ) -> DomainResult<PurchaseRewardResult> {
        info!("Purchasing reward {} for child {}", command.reward_id, command.child_id);

        let mut tx = StoreTransaction::begin(&self.connection, guardian_id).await;
        let mut child = tx
            .get_child(&command.child_id)?
            .ok_or_else(|| DomainError::not_found("Child", &command.child_id))?;
        let mut reward = tx
            .get_reward(&command.reward_id)?
            .ok_or_else(|| DomainError::not_found("Reward", &command.reward_id))?;

        if !reward.is_eligible(&child.id) {
            warn!("Child {} is not eligible for reward {}", child.id, reward.id);
            return Err(DomainError::NotEligible {
                child_id: child.id,
                reward: reward.title,
            });
        }

        // Leaves the balance untouched when it can't cover the cost
        if let Err(e) = child.debit(reward.cost) {
            warn!("Purchase of {} by {} rejected: {}", reward.id, child.id, e);
            return Err(e);
        }
        if reward.is_sold_out() {
            warn!("Purchase of {} by {} rejected: sold out", reward.id, child.id);
            return Err(DomainError::SoldOut { reward: reward.title });
        }

        let now = Utc::now();
        reward.inventory -= 1;
        child.updated_at = now;
        let owned_count = tx
            .get_owned_count(&child.id, &reward.id)?
            .checked_add(1)
            .ok_or_else(|| DomainError::validation("Owned count would overflow"))?;
        let history_entry = HistoryEntry::new(&reward.title, reward.cost, PointAction::Subtract, now);

        tx.put_child(&child)?;
        tx.put_reward(&reward)?;
        tx.set_owned_count(&child.id, &reward.id, owned_count)?;
        tx.append_history(&child.id, &history_entry)?;
        tx.commit()?;

        info!(
            "{} bought {} for {} points, {} points left, {} in stock",
            child.name, reward.title, reward.cost, child.points, reward.inventory
        );
        Ok(PurchaseRewardResult {
            success_message: format!("{} purchased {}", child.name, reward.title),
            child,
            reward,
            owned_count,
            history_entry,
        })
    }

    /// Rewards a child owns, with counts
    pub async fn list_owned_items(&self, guardian_id: &str, child_id: &str) -> DomainResult<Vec<OwnedItem>> {
        if self.children.get_child(guardian_id, child_id).await?.is_none() {
            return Err(DomainError::not_found("Child", child_id));
        }
        Ok(self.ownership.list_owned_items(guardian_id, child_id).await?)
    }

    fn check_children_exist(tx: &StoreTransaction, child_ids: &[String]) -> DomainResult<()> {
        for child_id in child_ids {
            if tx.get_child(child_id)?.is_none() {
                return Err(DomainError::not_found("Child", child_id));
            }
        }
        Ok(())
    }

    /// Keeps first-seen order; an empty list is rejected
    fn dedup_children(child_ids: Vec<String>) -> DomainResult<Vec<String>> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = child_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();

        if unique.is_empty() {
            return Err(DomainError::validation("A reward needs at least one eligible child"));
        }
        Ok(unique)
    }

    fn validate_title(title: &str) -> DomainResult<String> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Reward title cannot be empty"));
        }
        if trimmed.chars().count() > MAX_TITLE_LENGTH {
            return Err(DomainError::validation(format!(
                "Reward title cannot exceed {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        Ok(trimmed.to_string())
    }

    fn validate_icon(icon: &str) -> DomainResult<String> {
        let trimmed = icon.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Reward icon cannot be empty"));
        }
        Ok(trimmed.to_string())
    }

    fn validate_cost(cost: u32) -> DomainResult<()> {
        if cost == 0 {
            return Err(DomainError::validation("Reward cost must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::child_service::ChildService;
    use crate::domain::models::child::Child;
    use crate::storage::csv::test_utils::{sample_child, sample_reward, TestEnvironment, GUARDIAN_ID};
    use crate::storage::csv::HistoryRepository;
    use crate::storage::HistoryStorage;

    async fn seed_child(env: &TestEnvironment, name: &str, points: u32) -> Child {
        let child = sample_child(name, points);
        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        tx.put_child(&child).unwrap();
        tx.commit().unwrap();
        child
    }

    fn create_command(title: &str, cost: u32, inventory: u32, eligible: &[&Child]) -> CreateRewardCommand {
        CreateRewardCommand {
            title: title.to_string(),
            cost,
            icon: "🍦".to_string(),
            inventory,
            eligible_children: eligible.iter().map(|c| c.id.clone()).collect(),
        }
    }

    fn purchase(reward: &Reward, child: &Child) -> PurchaseRewardCommand {
        PurchaseRewardCommand {
            reward_id: reward.id.clone(),
            child_id: child.id.clone(),
        }
    }

    #[tokio::test]
    async fn test_purchase_moves_points_stock_and_history_together() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let child = seed_child(&env, "Emma", 100).await;
        let reward = service
            .create_reward(GUARDIAN_ID, create_command("Ice cream", 40, 3, &[&child]))
            .await
            .unwrap()
            .reward;

        let result = service.purchase_reward(GUARDIAN_ID, purchase(&reward, &child)).await.unwrap();
        assert_eq!(result.child.points, 60);
        assert_eq!(result.reward.inventory, 2);
        assert_eq!(result.owned_count, 1);
        assert_eq!(result.history_entry.delta(), -40);
        assert_eq!(result.history_entry.title, "Ice cream");

        // Persisted state matches the result
        let children = ChildRepository::new(env.connection.clone());
        assert_eq!(children.get_child(GUARDIAN_ID, &child.id).await.unwrap().unwrap().points, 60);
        assert_eq!(service.get_reward(GUARDIAN_ID, &reward.id).await.unwrap().inventory, 2);
        let items = service.list_owned_items(GUARDIAN_ID, &child.id).await.unwrap();
        assert_eq!(items, vec![OwnedItem { reward_id: reward.id.clone(), count: 1 }]);
        let history = HistoryRepository::new(env.connection.clone())
            .list_history(GUARDIAN_ID, &child.id)
            .await
            .unwrap();
        assert_eq!(history, vec![result.history_entry]);
    }

    #[tokio::test]
    async fn test_insufficient_points_changes_nothing() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let child = seed_child(&env, "Emma", 10).await;
        let reward = service
            .create_reward(GUARDIAN_ID, create_command("Ice cream", 40, 3, &[&child]))
            .await
            .unwrap()
            .reward;

        let err = service.purchase_reward(GUARDIAN_ID, purchase(&reward, &child)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientPoints { required: 40, available: 10 }
        ));

        let children = ChildRepository::new(env.connection.clone());
        assert_eq!(children.get_child(GUARDIAN_ID, &child.id).await.unwrap().unwrap().points, 10);
        assert_eq!(service.get_reward(GUARDIAN_ID, &reward.id).await.unwrap().inventory, 3);
        assert!(service.list_owned_items(GUARDIAN_ID, &child.id).await.unwrap().is_empty());
        let history = HistoryRepository::new(env.connection.clone())
            .list_history(GUARDIAN_ID, &child.id)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_last_unit_can_be_bought_then_sold_out() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let child = seed_child(&env, "Emma", 100).await;
        let reward = service
            .create_reward(GUARDIAN_ID, create_command("Movie night", 30, 1, &[&child]))
            .await
            .unwrap()
            .reward;

        let result = service.purchase_reward(GUARDIAN_ID, purchase(&reward, &child)).await.unwrap();
        assert_eq!(result.reward.inventory, 0);

        let err = service.purchase_reward(GUARDIAN_ID, purchase(&reward, &child)).await.unwrap_err();
        assert!(matches!(err, DomainError::SoldOut { .. }));
        let children = ChildRepository::new(env.connection.clone());
        assert_eq!(children.get_child(GUARDIAN_ID, &child.id).await.unwrap().unwrap().points, 70);
    }

    #[tokio::test]
    async fn test_ineligible_and_unknown_purchases() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let emma = seed_child(&env, "Emma", 100).await;
        let noah = seed_child(&env, "Noah", 100).await;
        let reward = service
            .create_reward(GUARDIAN_ID, create_command("Ice cream", 40, 3, &[&emma]))
            .await
            .unwrap()
            .reward;

        let err = service.purchase_reward(GUARDIAN_ID, purchase(&reward, &noah)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotEligible { .. }));

        let unknown = PurchaseRewardCommand {
            reward_id: "reward::1::missing".to_string(),
            child_id: emma.id.clone(),
        };
        assert!(matches!(
            service.purchase_reward(GUARDIAN_ID, unknown).await,
            Err(DomainError::NotFound { entity: "Reward", .. })
        ));
        assert_eq!(service.get_reward(GUARDIAN_ID, &reward.id).await.unwrap().inventory, 3);
    }

    #[tokio::test]
    async fn test_concurrent_purchases_never_oversell() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let child = seed_child(&env, "Emma", 1000).await;
        let reward = service
            .create_reward(GUARDIAN_ID, create_command("Sticker", 10, 3, &[&child]))
            .await
            .unwrap()
            .reward;

        let mut handles = Vec::new();
        for _ in 0..6 {
            let service = service.clone();
            let command = purchase(&reward, &child);
            handles.push(tokio::spawn(async move {
                service.purchase_reward(GUARDIAN_ID, command).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(DomainError::SoldOut { .. }) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(succeeded, 3);

        let children = ChildRepository::new(env.connection.clone());
        assert_eq!(children.get_child(GUARDIAN_ID, &child.id).await.unwrap().unwrap().points, 970);
        assert_eq!(service.get_reward(GUARDIAN_ID, &reward.id).await.unwrap().inventory, 0);
    }

    #[tokio::test]
    async fn test_create_reward_validation() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let child = seed_child(&env, "Emma", 0).await;

        assert!(service
            .create_reward(GUARDIAN_ID, create_command("", 10, 1, &[&child]))
            .await
            .is_err());
        assert!(service
            .create_reward(GUARDIAN_ID, create_command("Ice cream", 0, 1, &[&child]))
            .await
            .is_err());
        assert!(service
            .create_reward(GUARDIAN_ID, create_command("Ice cream", 10, 1, &[]))
            .await
            .is_err());

        let mut no_icon = create_command("Ice cream", 10, 1, &[&child]);
        no_icon.icon = " ".to_string();
        assert!(service.create_reward(GUARDIAN_ID, no_icon).await.is_err());

        let mut stranger = create_command("Ice cream", 10, 1, &[&child]);
        stranger.eligible_children.push("child::1::missing".to_string());
        assert!(matches!(
            service.create_reward(GUARDIAN_ID, stranger).await,
            Err(DomainError::NotFound { entity: "Child", .. })
        ));

        assert!(service.list_rewards(GUARDIAN_ID, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_list_and_delete_rewards() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let emma = seed_child(&env, "Emma", 0).await;
        let noah = seed_child(&env, "Noah", 0).await;

        let ice_cream = service
            .create_reward(GUARDIAN_ID, create_command("Ice cream", 40, 3, &[&emma, &emma]))
            .await
            .unwrap()
            .reward;
        assert_eq!(ice_cream.eligible_children, vec![emma.id.clone()]);
        service
            .create_reward(GUARDIAN_ID, create_command("Sticker", 5, 10, &[&noah]))
            .await
            .unwrap();

        let for_emma = service.list_rewards(GUARDIAN_ID, Some(&emma.id)).await.unwrap();
        assert_eq!(for_emma.len(), 1);
        assert_eq!(service.list_rewards(GUARDIAN_ID, None).await.unwrap().len(), 2);

        let updated = service
            .update_reward(
                GUARDIAN_ID,
                UpdateRewardCommand {
                    reward_id: ice_cream.id.clone(),
                    cost: Some(35),
                    inventory: Some(0),
                    eligible_children: Some(vec![emma.id.clone(), noah.id.clone()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .reward;
        assert_eq!(updated.cost, 35);
        assert_eq!(updated.inventory, 0);
        assert_eq!(updated.title, "Ice cream");
        assert_eq!(service.list_rewards(GUARDIAN_ID, Some(&noah.id)).await.unwrap().len(), 2);

        service.delete_reward(GUARDIAN_ID, &ice_cream.id).await.unwrap();
        assert!(matches!(
            service.delete_reward(GUARDIAN_ID, &ice_cream.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deleting_only_eligible_child_removes_reward() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());
        let children = ChildService::new(env.connection.clone(), 1024);
        let noah = seed_child(&env, "Noah", 0).await;

        let comic = service
            .create_reward(GUARDIAN_ID, create_command("Comic", 20, 2, &[&noah]))
            .await
            .unwrap()
            .reward;

        let deleted = children.delete_child(GUARDIAN_ID, &noah.id).await.unwrap();
        assert_eq!(deleted.removed_rewards, 1);

        assert!(service.list_rewards(GUARDIAN_ID, None).await.unwrap().is_empty());
        let update = service
            .update_reward(
                GUARDIAN_ID,
                UpdateRewardCommand {
                    reward_id: comic.id.clone(),
                    cost: Some(7),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(update, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_rejects_reward_without_eligible_children() {
        let env = TestEnvironment::new().unwrap();
        let service = RewardService::new(env.connection.clone());

        // Catalog written before eligibility lists were enforced
        let orphan = sample_reward("Comic", 20, 2, &[]);
        let mut tx = StoreTransaction::begin(&env.connection, GUARDIAN_ID).await;
        tx.put_reward(&orphan).unwrap();
        tx.commit().unwrap();

        let update = service
            .update_reward(
                GUARDIAN_ID,
                UpdateRewardCommand {
                    reward_id: orphan.id.clone(),
                    cost: Some(7),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(update, Err(DomainError::Validation(_))));

        let stored = service.get_reward(GUARDIAN_ID, &orphan.id).await.unwrap();
        assert_eq!(stored.cost, 20);
    }
}
