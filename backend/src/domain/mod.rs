//! # Domain Module
//!
//! Business rules of the chore tracker, independent of HTTP and of the file
//! layout on disk.
//!
//! ## Module Organization
//!
//! - **identity_service**: guardian accounts, password checks and sessions
//! - **child_service**: the child roster and profile pictures
//! - **task_service**: chores and the pending → ongoing → confirmation →
//!   completed workflow
//! - **reward_service**: the reward store and purchases
//! - **history_service**: the per-child point ledger
//!
//! ## Business Rules
//!
//! - A point balance never goes below zero
//! - Every change to a balance made here is recorded in the child's history
//!   in the same store transaction, so the balance equals the ledger total
//! - Reward inventory never goes below zero
//! - Completed tasks are final; points are awarded exactly once

pub mod commands;
pub mod error;
pub mod models;

pub mod identity_service;
pub mod child_service;
pub mod task_service;
pub mod reward_service;
pub mod history_service;

pub use error::{DomainError, DomainResult};
pub use identity_service::IdentityService;
pub use child_service::ChildService;
pub use task_service::TaskService;
pub use reward_service::RewardService;
pub use history_service::HistoryService;
