//! Core data models for Promptline
//!
//! This module contains the data structures shared between the framer,
//! the transaction runner, and the client façade.

pub mod command_result;

// Re-exports for convenience
pub use command_result::{BoundaryKind, CommandResult};
