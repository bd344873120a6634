//! Commerce Server Library
//!
//! Order lifecycle engine for the commerce backend: stock validation and
//! reservation, payment authorization, and the paid/delivered/canceled/
//! refunded transitions. External collaborators (record store, payment
//! gateway, notifier) are injected behind traits.

pub mod core;
pub mod engine;
pub mod notify;
pub mod payment;
pub mod store;
pub mod utils;

// Re-exports
pub use core::Config;
pub use engine::{EngineError, EngineResult, OrderEngine, PlacedOrder};
pub use store::MemoryStore;
