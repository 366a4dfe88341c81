//! # REST API for Guardians and Sessions
//!
//! Registration, sign in and sign out, and the current guardian's profile.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{error, info};
use shared::{CurrentGuardianResponse, RegisterGuardianRequest, SignInRequest, UpdateGuardianRequest};

use crate::io::rest::mappers::GuardianMapper;
use crate::io::rest::{ApiJson, AuthenticatedGuardian};
use crate::AppState;

/// Register a new guardian account
pub async fn register_guardian(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterGuardianRequest>,
) -> impl IntoResponse {
    info!("POST /api/guardians - email: {}", request.email);

    let command = GuardianMapper::to_register_command(request);
    match state.identity_service.register(command).await {
        Ok(guardian) => {
            let response = CurrentGuardianResponse {
                guardian: GuardianMapper::to_dto(guardian),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to register guardian: {}", e);
            e.into_response()
        }
    }
}

/// Sign in and receive a session token
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignInRequest>,
) -> impl IntoResponse {
    info!("POST /api/session - email: {}", request.email);

    match state.identity_service.sign_in(GuardianMapper::to_sign_in_command(request)).await {
        Ok(result) => (StatusCode::OK, Json(GuardianMapper::to_session_response(result))).into_response(),
        Err(e) => {
            error!("Sign in failed: {}", e);
            e.into_response()
        }
    }
}

/// The guardian behind the current session
pub async fn current_guardian(auth: AuthenticatedGuardian) -> impl IntoResponse {
    info!("GET /api/session - guardian: {}", auth.guardian.id);

    let response = CurrentGuardianResponse {
        guardian: GuardianMapper::to_dto(auth.guardian),
    };
    (StatusCode::OK, Json(response))
}

/// End the current session
pub async fn sign_out(State(state): State<AppState>, auth: AuthenticatedGuardian) -> impl IntoResponse {
    info!("DELETE /api/session - guardian: {}", auth.guardian.id);

    state.identity_service.sign_out(&auth.token).await;
    StatusCode::NO_CONTENT
}

/// Change the current guardian's display name
pub async fn update_guardian(
    State(state): State<AppState>,
    auth: AuthenticatedGuardian,
    ApiJson(request): ApiJson<UpdateGuardianRequest>,
) -> impl IntoResponse {
    info!("PUT /api/guardians/me - guardian: {}", auth.guardian.id);

    match state
        .identity_service
        .update_display_name(&auth.guardian.id, &request.display_name)
        .await
    {
        Ok(guardian) => {
            let response = CurrentGuardianResponse {
                guardian: GuardianMapper::to_dto(guardian),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to update guardian {}: {}", auth.guardian.id, e);
            e.into_response()
        }
    }
}
