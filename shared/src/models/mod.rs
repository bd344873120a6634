//! Data models
//!
//! Domain entities shared between the engine and its callers.
//! All IDs are `String` (UUID v4 assigned by the record store on create).

pub mod order;
pub mod product;
pub mod user;

// Re-exports
pub use order::*;
pub use product::*;
pub use user::*;
