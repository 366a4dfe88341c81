//! # Storage Module
//!
//! Persistence for guardians, children, tasks, rewards, owned items and point
//! history. Domain services depend on the traits; the file-backed
//! implementation lives in [`csv`].

pub mod csv;
pub mod traits;

pub use self::csv::{CsvConnection, StoreTransaction};
pub use traits::*;
