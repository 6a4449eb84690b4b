//! Shared types for the dispatch system.

pub mod types;

pub use types::EntityId;
