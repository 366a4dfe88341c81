//! Conversions between the public DTOs in `shared` and domain types.

pub mod guardian_mapper;
pub mod child_mapper;
pub mod task_mapper;
pub mod reward_mapper;
pub mod history_mapper;

pub use guardian_mapper::GuardianMapper;
pub use child_mapper::ChildMapper;
pub use task_mapper::TaskMapper;
pub use reward_mapper::RewardMapper;
pub use history_mapper::HistoryMapper;
