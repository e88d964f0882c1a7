//! Request extractors.

mod path_id;

pub use path_id::{AgentPath, ComponentId, GraphPath, PathId, ProjectPath, TenantPath};
