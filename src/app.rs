//! Application module
//!
//! This module re-exports the main application type from the editor module.
//! It provides a convenient access point for the main application entry.

pub use crate::editor::FlowStudioApp;

// Re-export commonly used types for convenience
pub use crate::editor::Route;
