//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Requests are
//! decoded into shared DTOs, mapped onto domain commands, and domain results
//! and errors are mapped back into JSON responses.
//!
//! ## Current Implementation
//!
//! - **Web Framework**: Axum
//! - **Serialization**: Serde DTOs from the `shared` crate
//! - **Authentication**: bearer session tokens, resolved by an extractor
//! - **Error Handling**: `DomainError` renders as `{"error", "code"}` with a
//!   matching status code

pub mod rest;

pub use rest::*;
