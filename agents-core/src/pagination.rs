//! Page-based pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    /// Build a page request from optional query values, applying defaults.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, ValidationError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::InvalidValue {
                field: "limit".to_string(),
                reason: format!("must be between 1 and {MAX_PAGE_LIMIT}"),
            });
        }
        Ok(Self { page, limit })
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Pagination metadata for a result set of `total` rows.
    pub fn info(&self, total: u64) -> PaginationInfo {
        let limit = u64::from(self.limit.max(1));
        PaginationInfo {
            page: self.page,
            limit: self.limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Pagination metadata returned with list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total: u64) -> Self {
        Self {
            data,
            pagination: pagination.info(total),
        }
    }

    /// Convert every item, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::new(None, None).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert!(Pagination::new(None, Some(101)).is_err());
        assert!(Pagination::new(None, Some(100)).is_ok());
    }

    #[test]
    fn test_info_rounds_pages_up() {
        let p = Pagination::new(Some(2), Some(10)).unwrap();
        let info = p.info(21);
        assert_eq!(info.pages, 3);
        assert_eq!(info.total, 21);
        assert_eq!(p.offset(), 10);
        assert_eq!(p.info(0).pages, 0);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_total(page in 1u32..50, limit in 1u32..=100, total in 0u64..10_000) {
            let p = Pagination::new(Some(page), Some(limit)).unwrap();
            let info = p.info(total);
            prop_assert!(info.pages * u64::from(limit) >= total);
            prop_assert!(info.pages == 0 || (info.pages - 1) * u64::from(limit) < total);
        }
    }
}
