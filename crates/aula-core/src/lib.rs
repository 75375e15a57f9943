//! aula-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other aula crates,
//! providing type-safe identifiers, a unified error type with HTTP status
//! mapping, and application configuration.

pub mod config;
pub mod error;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use error::{DenyReason, Error, Result};
pub use ids::*;
