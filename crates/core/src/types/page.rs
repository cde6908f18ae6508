//! Offset pagination for the store listing.

use serde::{Deserialize, Serialize};

/// A 1-based page request with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    page: u32,
    per_page: u32,
}

impl Pagination {
    /// Stores shown per listing page.
    pub const STORES_PER_PAGE: u32 = 4;

    /// Create a page request. Page 0 is treated as page 1.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    /// Page request for the store listing.
    #[must_use]
    pub const fn stores(page: u32) -> Self {
        Self::new(page, Self::STORES_PER_PAGE)
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page (SQL `LIMIT`).
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.per_page as i64
    }

    /// Rows to skip (SQL `OFFSET`).
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    /// Number of pages needed for `total` rows: `ceil(total / per_page)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn page_count(&self, total: i64) -> u32 {
        if total <= 0 {
            return 0;
        }
        let per_page = self.per_page as i64;
        ((total + per_page - 1) / per_page) as u32
    }

    /// Whether an empty result means the caller asked past the last page.
    ///
    /// Page 1 of an empty table is a legitimately empty listing, not an
    /// out-of-range request.
    #[must_use]
    pub const fn is_past_end(&self, returned: usize) -> bool {
        returned == 0 && self.offset() > 0
    }
}
