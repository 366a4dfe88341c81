//! # REST API Interface Layer
//!
//! One module of handlers per resource. Handlers log the request, call a
//! single domain service method, and translate the result. Every route except
//! registration and sign in requires an authenticated guardian, and all data
//! access is scoped to that guardian.

pub mod auth;
pub mod extract;
pub mod error;
pub mod mappers;

pub mod guardian_apis;
pub mod child_apis;
pub mod task_apis;
pub mod reward_apis;
pub mod history_apis;

pub use auth::AuthenticatedGuardian;
pub use extract::{ApiJson, ApiQuery};
