//! Service Layer
//!
//! Orchestration that spans many tables: whole graphs and whole projects.
//! Route handlers stay thin and call into these services.

mod graph_full_service;
mod project_full_service;

pub use graph_full_service::*;
pub use project_full_service::*;
