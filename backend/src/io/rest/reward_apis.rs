//! # REST API for the Reward Store

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{error, info, warn};
use shared::{CreateRewardRequest, PurchaseRewardRequest, RewardListRequest, UpdateRewardRequest};

use crate::domain::DomainError;
use crate::io::rest::mappers::RewardMapper;
use crate::io::rest::{ApiJson, ApiQuery, AuthenticatedGuardian};
use crate::AppState;

pub async fn create_reward(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    ApiJson(request): ApiJson<CreateRewardRequest>,
) -> impl IntoResponse {
    info!("POST /api/rewards - request: {:?}", request);

    let command = RewardMapper::to_create_command(request);
    match state.reward_service.create_reward(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::CREATED, Json(RewardMapper::to_reward_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to create reward: {}", e);
            e.into_response()
        }
    }
}

/// List rewards, or only those a given child may buy
pub async fn list_rewards(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    ApiQuery(query): ApiQuery<RewardListRequest>,
) -> impl IntoResponse {
    info!("GET /api/rewards - query: {:?}", query);

    match state
        .reward_service
        .list_rewards(&auth.guardian.id, query.child_id.as_deref())
        .await
    {
        Ok(rewards) => (StatusCode::OK, Json(RewardMapper::to_reward_list_dto(rewards))).into_response(),
        Err(e) => {
            error!("Failed to list rewards: {}", e);
            e.into_response()
        }
    }
}

pub async fn get_reward(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(reward_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/rewards/{}", reward_id);

    match state.reward_service.get_reward(&auth.guardian.id, &reward_id).await {
        Ok(reward) => (StatusCode::OK, Json(RewardMapper::to_dto(reward))).into_response(),
        Err(e) => {
            error!("Failed to get reward {}: {}", reward_id, e);
            e.into_response()
        }
    }
}

pub async fn update_reward(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(reward_id): Path<String>,
    ApiJson(request): ApiJson<UpdateRewardRequest>,
) -> impl IntoResponse {
    info!("PUT /api/rewards/{} - request: {:?}", reward_id, request);

    let command = RewardMapper::to_update_command(reward_id.clone(), request);
    match state.reward_service.update_reward(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::OK, Json(RewardMapper::to_reward_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to update reward {}: {}", reward_id, e);
            e.into_response()
        }
    }
}

pub async fn delete_reward(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(reward_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/rewards/{}", reward_id);

    match state.reward_service.delete_reward(&auth.guardian.id, &reward_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete reward {}: {}", reward_id, e);
            e.into_response()
        }
    }
}

/// Buy one unit of a reward for a child
pub async fn purchase_reward(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(reward_id): Path<String>,
    ApiJson(request): ApiJson<PurchaseRewardRequest>,
) -> impl IntoResponse {
    info!("POST /api/rewards/{}/purchase - child: {}", reward_id, request.child_id);

    let command = RewardMapper::to_purchase_command(reward_id.clone(), request);
    match state.reward_service.purchase_reward(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::OK, Json(RewardMapper::to_purchase_response_dto(result))).into_response(),
        // Refused purchases
        Err(e @ (DomainError::InsufficientPoints { .. } | DomainError::SoldOut { .. } | DomainError::NotEligible { .. })) => {
            warn!("Purchase of reward {} refused: {}", reward_id, e);
            e.into_response()
        }
        Err(e) => {
            error!("Failed to purchase reward {}: {}", reward_id, e);
            e.into_response()
        }
    }
}
