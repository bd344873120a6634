//! Shared types for the commerce backend
//!
//! Domain models (products, orders, users) and the unified error
//! system used across crates.

pub mod error;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
