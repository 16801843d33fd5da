//! Offset pagination contract for list operations
//!
//! List requests carry a 1-indexed `page` and a `limit`. Missing or zero values
//! are replaced by configured defaults, the store is queried with
//! `skip = (page - 1) * limit`, and the effective values are echoed back to the
//! client as response headers. No total count is computed.
//!
//! # Example
//!
//! ```rust
//! use users_service::pagination::{Pagination, PaginationDefaults};
//!
//! let defaults = PaginationDefaults::default();
//! let effective = defaults.normalize(Pagination::new(0, 0));
//! assert_eq!(effective, Pagination::new(1, 10));
//!
//! let page2 = defaults.normalize(Pagination::new(2, 5));
//! assert_eq!(page2.skip(), 5);
//! ```

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// Response header carrying the effective page
pub const PAGE_HEADER: HeaderName = HeaderName::from_static("x-pagination-page");

/// Response header carrying the effective limit
pub const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-pagination-limit");

/// Page selection for a list operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-indexed page number
    pub page: u32,
    /// Maximum number of items per page
    pub limit: u32,
}

impl Pagination {
    /// Create pagination parameters
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Number of items to skip; a zero page is treated as the first page
    #[must_use]
    pub fn skip(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }
}

/// Values substituted for missing pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationDefaults {
    /// Page used when the request carries none
    pub page: u32,
    /// Limit used when the request carries none
    pub limit: u32,
    /// Optional ceiling for requested limits
    pub max_limit: Option<u32>,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            max_limit: None,
        }
    }
}

impl From<&PaginationConfig> for PaginationDefaults {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            page: config.default_page.max(1),
            limit: config.default_limit.max(1),
            max_limit: config.max_limit.filter(|max| *max > 0),
        }
    }
}

impl PaginationDefaults {
    /// Replace zero values with defaults and apply the limit ceiling
    #[must_use]
    pub fn normalize(&self, requested: Pagination) -> Pagination {
        let page = if requested.page == 0 { self.page } else { requested.page };
        let limit = if requested.limit == 0 { self.limit } else { requested.limit };
        let limit = match self.max_limit {
            Some(max) => limit.min(max),
            None => limit,
        };
        Pagination { page, limit }
    }
}

/// One page of list results with the effective pagination
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page, in store order
    pub items: Vec<T>,
    /// Pagination actually applied
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Map the items, keeping the pagination
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Write the effective pagination into response headers
pub fn attach_metadata(headers: &mut HeaderMap, pagination: Pagination) {
    headers.insert(PAGE_HEADER, HeaderValue::from(pagination.page));
    headers.insert(LIMIT_HEADER, HeaderValue::from(pagination.limit));
}
