// Clippy allows for reasonable defaults
#![allow(clippy::too_many_arguments)] // Capability wiring needs many params
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer
#![allow(clippy::field_reassign_with_default)] // Builder pattern is clearer
#![allow(clippy::redundant_closure)] // |x| f(x) can be clearer than f
#![allow(clippy::unwrap_or_default)] // unwrap_or_else(Default::default) can be clearer

// Module declarations
pub mod config;
pub mod events;
pub mod export;
pub mod lifetime;
pub mod models;
pub mod render;
pub mod services;
pub mod share;
pub mod workspace;

// Re-export the types most callers need
pub use models::*;
pub use workspace::{Panel, View, Workspace, WorkspaceDeps, WorkspaceError};
