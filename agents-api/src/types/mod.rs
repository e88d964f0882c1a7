//! API Request and Response Types
//!
//! Envelopes shared by every route, plus request bodies and query strings
//! that do not map one to one onto an `agents-core` type.

use agents_core::{Paginated, PaginationInfo};
use serde::{Deserialize, Serialize};

mod api_key;
pub use api_key::*;

mod conversation;
pub use conversation::*;

mod graph;
pub use graph::*;

mod project;
pub use project::*;

/// Single entity envelope: `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// List envelope: `{"data": [...], "pagination": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

impl<T> From<Paginated<T>> for ListResponse<T> {
    fn from(page: Paginated<T>) -> Self {
        Self {
            data: page.data,
            pagination: page.pagination,
        }
    }
}

/// Generates a query-string struct carrying `page` and `limit` next to the
/// listed filter fields.
///
/// `#[serde(flatten)]` cannot be used here: flattened query fields lose
/// their numeric parsing.
macro_rules! paginated_query {
    ($(#[$meta:meta])* $name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
        #[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
        pub struct $name {
            /// 1-based page number (default 1)
            pub page: Option<u32>,
            /// Page size, 1 to 100 (default 10)
            pub limit: Option<u32>,
            $(pub $field: Option<$ty>,)*
        }

        impl $name {
            pub fn pagination(&self) -> $crate::error::ApiResult<agents_core::Pagination> {
                Ok(agents_core::Pagination::new(self.page, self.limit)?)
            }
        }
    };
}
pub(crate) use paginated_query;

paginated_query! {
    /// Plain `?page=&limit=` query.
    PaginationQuery {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents_core::Pagination;

    #[test]
    fn test_pagination_query_defaults() {
        let query = PaginationQuery::default();
        let pagination = query.pagination().expect("defaults are valid");
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 10);
    }

    #[test]
    fn test_pagination_query_rejects_large_limit() {
        let query = PaginationQuery {
            page: Some(1),
            limit: Some(500),
        };
        assert!(query.pagination().is_err());
    }

    #[test]
    fn test_list_envelope_shape() -> Result<(), serde_json::Error> {
        let page = Paginated::new(vec!["a", "b"], Pagination::default(), 12);
        let value = serde_json::to_value(ListResponse::from(page))?;
        assert_eq!(value["data"], serde_json::json!(["a", "b"]));
        assert_eq!(value["pagination"]["total"], 12);
        assert_eq!(value["pagination"]["pages"], 2);
        Ok(())
    }
}
