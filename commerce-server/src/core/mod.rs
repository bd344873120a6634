//! Core server plumbing

pub mod config;

pub use config::Config;
