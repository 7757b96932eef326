//! Page/limit pagination.
//!
//! Listing endpoints take `page` (1-based) and `limit` query parameters and
//! answer with a [`Page`] envelope. Out-of-range inputs are clamped rather
//! than rejected.

use serde::Serialize;

/// Default number of rows per page when the caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Hard ceiling on rows per page.
pub const MAX_LIMIT: u32 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Clamp raw query values: `page` to at least 1, `limit` to
    /// `1..=max_limit` (missing or zero `limit` becomes `default_limit`).
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        let limit = match limit {
            None | Some(0) => default_limit,
            Some(n) => n,
        };
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.clamp(1, max_limit),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Row offset for `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_LIMIT, MAX_LIMIT)
    }
}

/// `ceil(total / limit)`; zero rows means zero pages.
#[must_use]
pub fn total_pages(total: i64, limit: u32) -> i64 {
    let limit = i64::from(limit.max(1));
    (total.max(0) + limit - 1) / limit
}

/// One page of a filtered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Assemble a page from the rows and the matching total count.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            data,
            page: request.page(),
            limit: request.limit(),
            total,
            total_pages: total_pages(total, request.limit()),
        }
    }

    /// Convert every row, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), DEFAULT_LIMIT);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let req = PageRequest::new(Some(0), Some(500), 20, 100);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 100);

        let req = PageRequest::new(Some(3), Some(0), 20, 100);
        assert_eq!(req.limit(), 20);
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(101, 10), 11);
    }

    #[test]
    fn test_page_envelope_serializes() {
        let page = Page::new(vec![1, 2], PageRequest::new(Some(2), Some(2), 20, 100), 5);
        let json = serde_json::to_value(&page).expect("serializes");
        assert_eq!(json["total_pages"], 3);
        assert_eq!(json["page"], 2);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
