//! Core data types for the agent graph platform.
//!
//! This crate holds no I/O. It defines tenancy scopes and resource ids, the
//! stored entities, partial updates, full graph and full project documents,
//! their structural validation, and the shared error types.

pub mod definitions;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod pagination;
pub mod settings;
pub mod updates;
pub mod validation;
pub mod views;

pub use definitions::*;
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
pub use pagination::*;
pub use settings::*;
pub use updates::*;
pub use validation::{validate_graph_definition, validate_project_definition, ProjectCatalog};
pub use views::*;
