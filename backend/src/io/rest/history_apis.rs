//! # REST API for Points, History and Owned Items
//!
//! All routes live under a child: `/api/children/{id}/...`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{error, info};
use shared::AdjustPointsRequest;

use crate::io::rest::mappers::{HistoryMapper, RewardMapper};
use crate::io::rest::{ApiJson, AuthenticatedGuardian};
use crate::AppState;

/// Add or subtract points by hand
pub async fn adjust_points(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
    ApiJson(request): ApiJson<AdjustPointsRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/points - request: {:?}", child_id, request);

    let command = HistoryMapper::to_adjust_command(child_id.clone(), request);
    match state.history_service.adjust_points(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::OK, Json(HistoryMapper::to_adjust_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to adjust points of child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// A child's history, newest first
pub async fn list_history(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/history", child_id);

    match state.history_service.list_history(&auth.guardian.id, &child_id).await {
        Ok(entries) => (StatusCode::OK, Json(HistoryMapper::to_list_dto(child_id, entries))).into_response(),
        Err(e) => {
            error!("Failed to list history of child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

pub async fn audit_balance(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/history/audit", child_id);

    match state.history_service.audit_balance(&auth.guardian.id, &child_id).await {
        Ok(audit) => (StatusCode::OK, Json(HistoryMapper::to_audit_dto(audit))).into_response(),
        Err(e) => {
            error!("Failed to audit child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// Mark a purchase as handed over
pub async fn mark_purchased(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path((child_id, entry_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/history/{}/purchased", child_id, entry_id);

    match state
        .history_service
        .mark_purchased(&auth.guardian.id, &child_id, &entry_id)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(HistoryMapper::to_entry_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to mark history entry {} as purchased: {}", entry_id, e);
            e.into_response()
        }
    }
}

/// How many of each reward a child owns
pub async fn list_owned_items(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/items", child_id);

    match state.reward_service.list_owned_items(&auth.guardian.id, &child_id).await {
        Ok(items) => (StatusCode::OK, Json(RewardMapper::to_owned_items_dto(child_id, items))).into_response(),
        Err(e) => {
            error!("Failed to list items of child {}: {}", child_id, e);
            e.into_response()
        }
    }
}
