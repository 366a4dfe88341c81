//! # Chore Tracker Backend
//!
//! HTTP service behind the chore tracker: guardians sign in, manage their
//! children, hand out chores worth points, and run a small reward store the
//! children spend those points in.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//!
//! ```text
//! ┌─────────────────┐
//! │   IO (REST)     │  axum handlers, DTO mapping, bearer auth
//! ├─────────────────┤
//! │     Domain      │  services, models, business rules
//! ├─────────────────┤
//! │    Storage      │  CSV / YAML documents, per-guardian transactions
//! └─────────────────┘
//! ```
//!
//! All data belongs to exactly one guardian. Every multi-document change runs
//! inside a `StoreTransaction`, which holds the guardian's lock and commits
//! its staged writes together.

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use log::info;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

pub use config::AppConfig;

use crate::domain::{ChildService, HistoryService, IdentityService, RewardService, TaskService};
use crate::io::rest::{child_apis, guardian_apis, history_apis, reward_apis, task_apis};
use crate::storage::CsvConnection;

/// Services shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub identity_service: IdentityService,
    pub child_service: ChildService,
    pub task_service: TaskService,
    pub reward_service: RewardService,
    pub history_service: HistoryService,
}

/// Open the data directory and wire up the domain services
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Initializing backend in {}", config.data_directory.display());

    let connection = CsvConnection::new(&config.data_directory)?;
    let session_ttl = chrono::Duration::hours(config.session_ttl_hours);

    Ok(AppState {
        identity_service: IdentityService::new(connection.clone(), session_ttl),
        child_service: ChildService::new(connection.clone(), config.max_picture_bytes),
        task_service: TaskService::new(connection.clone()),
        reward_service: RewardService::new(connection.clone()),
        history_service: HistoryService::new(connection),
    })
}

/// Build the application router with all API routes under `/api`
pub fn create_router(app_state: AppState, config: &AppConfig) -> Result<Router> {
    let origin = HeaderValue::from_str(&config.cors_origin)
        .with_context(|| format!("Invalid CORS origin: {}", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let picture_routes = get(child_apis::get_picture)
        .put(child_apis::upload_picture)
        .delete(child_apis::delete_picture)
        .layer(DefaultBodyLimit::max(config.max_picture_bytes));

    let api_routes = Router::new()
        .route("/guardians", post(guardian_apis::register_guardian))
        .route("/guardians/me", put(guardian_apis::update_guardian))
        .route(
            "/session",
            post(guardian_apis::sign_in)
                .get(guardian_apis::current_guardian)
                .delete(guardian_apis::sign_out),
        )
        .route("/children", get(child_apis::list_children).post(child_apis::create_child))
        .route(
            "/children/:id",
            get(child_apis::get_child)
                .put(child_apis::update_child)
                .delete(child_apis::delete_child),
        )
        .route("/children/:id/picture", picture_routes)
        .route("/children/:id/points", post(history_apis::adjust_points))
        .route("/children/:id/history", get(history_apis::list_history))
        .route("/children/:id/history/audit", get(history_apis::audit_balance))
        .route(
            "/children/:id/history/:entry_id/purchased",
            post(history_apis::mark_purchased),
        )
        .route("/children/:id/items", get(history_apis::list_owned_items))
        .route("/tasks", get(task_apis::list_tasks).post(task_apis::create_task))
        .route(
            "/tasks/:id",
            get(task_apis::get_task)
                .put(task_apis::update_task)
                .delete(task_apis::delete_task),
        )
        .route("/tasks/:id/accept", post(task_apis::accept_task))
        .route("/tasks/:id/submit", post(task_apis::submit_task))
        .route("/tasks/:id/complete", post(task_apis::complete_task))
        .route("/tasks/:id/status", put(task_apis::update_task_status))
        .route("/rewards", get(reward_apis::list_rewards).post(reward_apis::create_reward))
        .route(
            "/rewards/:id",
            get(reward_apis::get_reward)
                .put(reward_apis::update_reward)
                .delete(reward_apis::delete_reward),
        )
        .route("/rewards/:id/purchase", post(reward_apis::purchase_reward));

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
