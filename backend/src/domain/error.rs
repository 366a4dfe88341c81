use crate::domain::models::task::TaskStatus;

/// Errors returned by the domain services.
///
/// Every variant renders as a human-readable message; the REST layer maps
/// variants to status codes.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: u32, available: u32 },

    #[error("Reward '{reward}' is sold out")]
    SoldOut { reward: String },

    #[error("Reward '{reward}' is not available for child {child_id}")]
    NotEligible { child_id: String, reward: String },

    #[error("Cannot move task from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        DomainError::Validation(message.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
