//! Utility macros for reducing boilerplate

/// Macro to implement `FromRef<AppState>` for state extractors.
///
/// # Example
/// ```ignore
/// impl_from_ref!(SharedStore, store);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for SharedStore {
///     fn from_ref(state: &AppState) -> Self {
///         state.store.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}

/// Reject a request whose body id disagrees with the path id.
///
/// # Example
/// ```ignore
/// ensure_ids_match!("id", &agent_id, body.id.as_deref());
/// ```
#[macro_export]
macro_rules! ensure_ids_match {
    ($field:expr, $path:expr, $body:expr) => {
        if let Some(body_value) = $body {
            if body_value != $path {
                return Err($crate::error::ApiError::id_mismatch($field, $path, body_value));
            }
        }
    };
}
