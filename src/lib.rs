// Clippy allows for reasonable defaults
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer
#![allow(clippy::field_reassign_with_default)] // Builder pattern is clearer

// Module declarations
pub mod agents;
pub mod config;
pub mod events;
pub mod llm;
pub mod memory;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod shutdown;
mod utils;

// Server module (HTTP/WebSocket API)
pub mod server;

pub use models::*;
