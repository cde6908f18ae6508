//! Store read models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use delicious_core::{Location, Pagination, RatingSummary, Slug, StoreId, TagCount, UserId};

use super::{Author, Review};

/// Image shown for stores without an uploaded photo.
pub const DEFAULT_PHOTO_URL: &str = "/static/images/store.png";

/// Words of description shown on a store card.
const EXCERPT_WORDS: usize = 25;

/// A persisted store.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: UserId,
}

impl Store {
    /// Public URL of the store photo, or the placeholder image.
    #[must_use]
    pub fn photo_url(&self) -> String {
        photo_url(self.photo.as_deref())
    }

    /// First words of the description for listing cards.
    #[must_use]
    pub fn excerpt(&self) -> String {
        excerpt(&self.description)
    }

    /// Whether `user` may edit this store.
    #[must_use]
    pub fn is_owned_by(&self, user: Option<UserId>) -> bool {
        user == Some(self.author)
    }
}

/// A store with its author and reviews resolved, for the detail page.
#[derive(Debug, Clone, Serialize)]
pub struct StoreDetail {
    pub store: Store,
    pub author: Author,
    /// Newest first.
    pub reviews: Vec<Review>,
}

impl StoreDetail {
    /// Rating summary over the resolved reviews.
    #[must_use]
    pub fn rating(&self) -> Option<RatingSummary> {
        let ratings: Vec<i16> = self.reviews.iter().map(|r| r.rating).collect();
        RatingSummary::from_ratings(&ratings)
    }
}

/// One page of the store listing.
#[derive(Debug, Clone, Serialize)]
pub struct StorePage {
    pub stores: Vec<Store>,
    pub page: u32,
    /// `ceil(count / per_page)`.
    pub pages: u32,
    /// Total stores across all pages.
    pub count: i64,
}

impl StorePage {
    /// Assemble a page from a query result and the total count.
    #[must_use]
    pub fn new(stores: Vec<Store>, pagination: Pagination, count: i64) -> Self {
        Self {
            stores,
            page: pagination.page(),
            pages: pagination.page_count(count),
            count,
        }
    }

    /// Whether the request asked past the last page.
    #[must_use]
    pub fn is_past_end(&self, pagination: Pagination) -> bool {
        pagination.is_past_end(self.stores.len())
    }

    /// Previous page number, if any.
    #[must_use]
    pub const fn prev_page(&self) -> Option<u32> {
        if self.page > 1 { Some(self.page - 1) } else { None }
    }

    /// Next page number, if any.
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        if self.page < self.pages { Some(self.page + 1) } else { None }
    }
}

/// Stores filtered by tag plus the global tag histogram.
#[derive(Debug, Clone, Serialize)]
pub struct TagListing {
    /// Count descending, ties by tag ascending.
    pub tags: Vec<TagCount>,
    pub stores: Vec<Store>,
}

/// Projection returned by the geo search.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyStore {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub photo: Option<String>,
}

/// A ranked full-text search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    /// Text relevance, higher is better.
    pub score: f32,
}

/// A row of the top-rated listing.
#[derive(Debug, Clone, Serialize)]
pub struct TopStore {
    pub slug: Slug,
    pub name: String,
    pub photo: Option<String>,
    #[serde(flatten)]
    pub rating: RatingSummary,
}

impl TopStore {
    /// Public URL of the store photo, or the placeholder image.
    #[must_use]
    pub fn photo_url(&self) -> String {
        photo_url(self.photo.as_deref())
    }
}

fn photo_url(photo: Option<&str>) -> String {
    photo.map_or_else(
        || DEFAULT_PHOTO_URL.to_string(),
        |p| format!("/uploads/{p}"),
    )
}

fn excerpt(text: &str) -> String {
    let mut words = text.split_whitespace();
    let head: Vec<&str> = words.by_ref().take(EXCERPT_WORDS).collect();
    let mut out = head.join(" ");
    if words.next().is_some() {
        out.push('…');
    }
    out
}
