use crate::domain::commands::reward::{
    CreateRewardCommand, PurchaseRewardCommand, PurchaseRewardResult, RewardResult, UpdateRewardCommand,
};
use crate::domain::models::reward::{OwnedItem as DomainOwnedItem, Reward as DomainReward};
use crate::io::rest::mappers::{ChildMapper, HistoryMapper};
use shared::{
    CreateRewardRequest, OwnedItem as SharedOwnedItem, OwnedItemsResponse, PurchaseRewardRequest,
    PurchaseRewardResponse, Reward as SharedReward, RewardListResponse, RewardResponse, UpdateRewardRequest,
};

pub struct RewardMapper;

impl RewardMapper {
    pub fn to_dto(domain: DomainReward) -> SharedReward {
        SharedReward {
            id: domain.id,
            title: domain.title,
            cost: domain.cost,
            icon: domain.icon,
            inventory: domain.inventory,
            eligible_children: domain.eligible_children,
            created_at: domain.created_at.to_rfc3339(),
        }
    }

    pub fn to_create_command(request: CreateRewardRequest) -> CreateRewardCommand {
        CreateRewardCommand {
            title: request.title,
            cost: request.cost,
            icon: request.icon,
            inventory: request.inventory,
            eligible_children: request.eligible_children,
        }
    }

    pub fn to_update_command(reward_id: String, request: UpdateRewardRequest) -> UpdateRewardCommand {
        UpdateRewardCommand {
            reward_id,
            title: request.title,
            cost: request.cost,
            icon: request.icon,
            inventory: request.inventory,
            eligible_children: request.eligible_children,
        }
    }

    pub fn to_purchase_command(reward_id: String, request: PurchaseRewardRequest) -> PurchaseRewardCommand {
        PurchaseRewardCommand {
            reward_id,
            child_id: request.child_id,
        }
    }

    pub fn to_reward_response_dto(result: RewardResult) -> RewardResponse {
        RewardResponse {
            reward: Self::to_dto(result.reward),
            success_message: result.success_message,
        }
    }

    pub fn to_reward_list_dto(rewards: Vec<DomainReward>) -> RewardListResponse {
        RewardListResponse {
            rewards: rewards.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_purchase_response_dto(result: PurchaseRewardResult) -> PurchaseRewardResponse {
        PurchaseRewardResponse {
            child: ChildMapper::to_dto(result.child),
            reward: Self::to_dto(result.reward),
            owned_count: result.owned_count,
            history_entry: HistoryMapper::to_dto(result.history_entry),
            success_message: result.success_message,
        }
    }

    pub fn to_owned_items_dto(child_id: String, items: Vec<DomainOwnedItem>) -> OwnedItemsResponse {
        OwnedItemsResponse {
            child_id,
            items: items
                .into_iter()
                .map(|item| SharedOwnedItem {
                    reward_id: item.reward_id,
                    count: item.count,
                })
                .collect(),
        }
    }
}
