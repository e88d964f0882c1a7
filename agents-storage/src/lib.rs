//! Agents Storage - Store Trait, In-Memory Store and Data Access
//!
//! Defines the row-level storage abstraction for agent graph entities and the
//! data-access functions built on it. The Postgres implementation lives in
//! agents-api.

pub mod access;
pub mod component;
pub mod keys;
pub mod memory;
pub mod repository;
pub mod store;
pub mod table;

pub use component::Component;
pub use keys::{generate_api_key, hash_api_key, parse_api_key, verify_api_key, GeneratedApiKey};
pub use memory::InMemoryStore;
pub use store::{SharedStore, Store};
pub use table::{Filter, Page, Record, Table, ALL_TABLES};
