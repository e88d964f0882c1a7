//! Per-entity data access.
//!
//! Every function takes the store as `&dyn Store` plus the scope the entity
//! lives in. Nothing here knows about HTTP.

pub mod agent_graphs;
pub mod agent_relations;
pub mod agents;
pub mod api_keys;
pub mod artifact_components;
pub mod context_configs;
pub mod conversations;
pub mod credential_references;
pub mod data_components;
pub mod external_agents;
pub mod projects;
pub mod tools;
