// Clippy allows for reasonable defaults
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer
#![allow(clippy::field_reassign_with_default)] // Builder pattern is clearer
#![allow(clippy::redundant_closure)] // |x| f(x) can be clearer than f

// Module declarations
pub mod commands;
pub mod config;
pub mod conversation;
pub mod estimation;
pub mod models;
pub mod shutdown;
pub mod utils;

// Server module (HTTP API)
pub mod server;

// Re-export models for use in commands
pub use models::*;
