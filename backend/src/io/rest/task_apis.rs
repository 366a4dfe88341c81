//! # REST API for Tasks
//!
//! Task CRUD plus the status workflow. Completing a task answers with the
//! credited child and the new history entry as well as the task.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, info};
use shared::{CreateTaskRequest, TaskListRequest, UpdateTaskRequest, UpdateTaskStatusRequest};

use crate::domain::commands::task::TaskTransitionResult;
use crate::domain::DomainResult;
use crate::io::rest::mappers::TaskMapper;
use crate::io::rest::{ApiJson, ApiQuery, AuthenticatedGuardian};
use crate::AppState;

fn transition_response(task_id: &str, result: DomainResult<TaskTransitionResult>) -> Response {
    match result {
        Ok(TaskTransitionResult {
            task,
            award: Some(award),
            success_message,
        }) => (
            StatusCode::OK,
            Json(TaskMapper::to_complete_response_dto(task, award, success_message)),
        )
            .into_response(),
        Ok(result) => (StatusCode::OK, Json(TaskMapper::to_transition_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to change status of task {}: {}", task_id, e);
            e.into_response()
        }
    }
}

/// Create a task for a child
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/tasks - request: {:?}", request);

    let command = TaskMapper::to_create_command(request);
    match state.task_service.create_task(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::CREATED, Json(TaskMapper::to_task_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to create task: {}", e);
            e.into_response()
        }
    }
}

/// List tasks, optionally filtered by child and status
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    ApiQuery(query): ApiQuery<TaskListRequest>,
) -> impl IntoResponse {
    info!("GET /api/tasks - query: {:?}", query);

    match state
        .task_service
        .list_tasks(&auth.guardian.id, TaskMapper::to_list_query(query))
        .await
    {
        Ok(tasks) => (StatusCode::OK, Json(TaskMapper::to_task_list_dto(tasks))).into_response(),
        Err(e) => {
            error!("Failed to list tasks: {}", e);
            e.into_response()
        }
    }
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/tasks/{}", task_id);

    match state.task_service.get_task(&auth.guardian.id, &task_id).await {
        Ok(task) => (StatusCode::OK, Json(TaskMapper::to_dto(task))).into_response(),
        Err(e) => {
            error!("Failed to get task {}: {}", task_id, e);
            e.into_response()
        }
    }
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(task_id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> impl IntoResponse {
    info!("PUT /api/tasks/{} - request: {:?}", task_id, request);

    let command = TaskMapper::to_update_command(task_id.clone(), request);
    match state.task_service.update_task(&auth.guardian.id, command).await {
        Ok(result) => (StatusCode::OK, Json(TaskMapper::to_task_response_dto(result))).into_response(),
        Err(e) => {
            error!("Failed to update task {}: {}", task_id, e);
            e.into_response()
        }
    }
}

/// Delete a task. Points already awarded stay with the child.
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/tasks/{}", task_id);

    match state.task_service.delete_task(&auth.guardian.id, &task_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete task {}: {}", task_id, e);
            e.into_response()
        }
    }
}

pub async fn accept_task(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(task_id): Path<String>,
) -> Response {
    info!("POST /api/tasks/{}/accept", task_id);
    let result = state.task_service.accept_task(&auth.guardian.id, &task_id).await;
    transition_response(&task_id, result)
}

pub async fn submit_task(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(task_id): Path<String>,
) -> Response {
    info!("POST /api/tasks/{}/submit", task_id);
    let result = state.task_service.submit_task(&auth.guardian.id, &task_id).await;
    transition_response(&task_id, result)
}

pub async fn complete_task(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(task_id): Path<String>,
) -> Response {
    info!("POST /api/tasks/{}/complete", task_id);
    let result = state.task_service.complete_task(&auth.guardian.id, &task_id).await;
    transition_response(&task_id, result)
}

/// Move a task to the requested status
pub async fn update_task_status(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    Path(task_id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskStatusRequest>,
) -> Response {
    info!("PUT /api/tasks/{}/status - {:?}", task_id, request.status);
    let status = TaskMapper::status_to_domain(request.status);
    let result = state.task_service.set_status(&auth.guardian.id, &task_id, status).await;
    transition_response(&task_id, result)
}
