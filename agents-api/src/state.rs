//! Shared application state for Axum routers.

use agents_storage::SharedStore;
use std::time::Instant;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend, wrapped for metrics in production.
    pub store: SharedStore,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(SharedStore, store);
crate::impl_from_ref!(Instant, start_time);
