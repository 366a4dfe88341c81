//! # REST API for Child Management
//!
//! Endpoints for creating, retrieving, updating, and deleting children, and
//! for their profile pictures.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use log::{error, info};
use shared::{CreateChildRequest, UpdateChildRequest};

use crate::domain::commands::child::UploadPictureCommand;
use crate::io::rest::mappers::ChildMapper;
use crate::io::rest::{ApiJson, AuthenticatedGuardian};
use crate::AppState;

/// Create a new child
pub async fn create_child(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    ApiJson(request): ApiJson<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/children - request: {:?}", request);

    let command = ChildMapper::to_create_command(request);
    match state.child_service.create_child(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::CREATED, Json(ChildMapper::to_child_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to create child: {}", e);
            e.into_response()
        }
    }
}

/// Get a child by ID
pub async fn get_child(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}", child_id);

    match state.child_service.get_child(&auth.guardian.id, &child_id).await {
        Ok(child) => (StatusCode::OK, Json(ChildMapper::to_dto(child))).into_response(),
        Err(e) => {
            error!("Failed to get child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// List all children
pub async fn list_children(State(state): State<AppState>, auth: AuthenticatedGuardian) -> impl IntoResponse {
    info!("GET /api/children");

    match state.child_service.list_children(&auth.guardian.id).await {
        Ok(children) => (StatusCode::OK, Json(ChildMapper::to_child_list_dto(children))).into_response(),
        Err(e) => {
            error!("Failed to list children: {}", e);
            e.into_response()
        }
    }
}

/// Update a child
pub async fn update_child(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
    ApiJson(request): ApiJson<UpdateChildRequest>,
) -> impl IntoResponse {
    info!("PUT /api/children/{} - request: {:?}", child_id, request);

    let command = ChildMapper::to_update_command(child_id.clone(), request);
    match state.child_service.update_child(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::OK, Json(ChildMapper::to_child_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to update child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// Delete a child together with its tasks, items and history
pub async fn delete_child(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{}", child_id);

    match state.child_service.delete_child(&auth.guardian.id, &child_id).await {
        Ok(result) => (StatusCode::OK, Json(ChildMapper::to_delete_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to delete child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// Upload a profile picture. The body is the raw image; its type comes
/// from the `Content-Type` header.
pub async fn upload_picture(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    info!(
        "PUT /api/children/{}/picture - {} ({} bytes)",
        child_id,
        content_type,
        body.len()
    );

    let command = UploadPictureCommand {
        child_id: child_id.clone(),
        content_type,
        bytes: body.to_vec(),
    };
    match state.child_service.upload_picture(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::OK, Json(ChildMapper::to_child_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to upload picture for child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// Fetch a child's profile picture
pub async fn get_picture(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/picture", child_id);

    match state.child_service.get_picture(&auth.guardian.id, &child_id).await {
        Ok(picture) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, picture.content_type)],
            picture.bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to get picture for child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// Remove a child's profile picture
pub async fn delete_picture(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{}/picture", child_id);

    match state.child_service.delete_picture(&auth.guardian.id, &child_id).await {
        Ok(result) => (StatusCode::OK, Json(ChildMapper::to_child_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to delete picture for child {}: {}", child_id, e);
            e.into_response()
        }
    }
}
