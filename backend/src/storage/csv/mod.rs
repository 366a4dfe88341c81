//! # File Storage
//!
//! Everything is kept as human-readable files under one data directory:
//!
//! ```text
//! {data_directory}/
//! ├── guardians.yaml
//! └── guardians/{guardian}/
//!     ├── rewards.yaml
//!     ├── tasks.csv
//!     ├── pictures/{child}.{png|jpg|gif|webp}
//!     └── children/{child}/
//!         ├── child.yaml
//!         ├── items.yaml
//!         └── history.csv
//! ```
//!
//! Repositories implement the read traits from [`crate::storage::traits`];
//! writes are staged through a [`StoreTransaction`].

pub mod connection;
pub mod write_batch;
pub mod guardian_repository;
pub mod child_repository;
pub mod task_repository;
pub mod reward_repository;
pub mod ownership_repository;
pub mod history_repository;
pub mod picture_store;
pub mod transaction;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use write_batch::WriteBatch;
pub use guardian_repository::GuardianRepository;
pub use child_repository::ChildRepository;
pub use task_repository::TaskRepository;
pub use reward_repository::{EligibilityCleanup, RewardRepository};
pub use ownership_repository::OwnershipRepository;
pub use history_repository::HistoryRepository;
pub use picture_store::{extension_for_content_type, PictureStore};
pub use transaction::StoreTransaction;
