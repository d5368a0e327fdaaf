//! Page-based listing parameters.

use serde::Deserialize;

/// Default number of templates per page.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Maximum number of templates per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A 1-based page request, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Clamp user-provided values: `page >= 1`, `1 <= per_page <= MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Rows to skip. Saturates so an absurd `page` lands past the end
    /// instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page).max(0)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_PAGE_SIZE)
    }
}

/// Query parameters for paged list endpoints (`?page=&per_page=`).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
