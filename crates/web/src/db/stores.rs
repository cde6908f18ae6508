//! Store database operations.
//!
//! Slugs are assigned here, immediately before insert and before any update
//! that renames the store. The suffix is count-based: concurrent writers or
//! gaps in earlier suffixes can still produce duplicates.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::{
    GeoPoint, Location, Pagination, RatingSummary, Slug, StoreId, TagCount, UserId, ValidStore,
};

use super::{RepositoryError, ReviewRepository, UserRepository};
use crate::models::{NearbyStore, SearchHit, Store, StoreDetail, StorePage, TagListing, TopStore};

/// Maximum results for a text search.
pub const SEARCH_LIMIT: i64 = 5;
/// Maximum results for a geo search.
pub const NEAR_LIMIT: i64 = 10;
/// Geo search radius in meters.
pub const NEAR_RADIUS_METERS: f64 = 10_000.0;
/// Maximum rows in the top-rated listing.
pub const TOP_LIMIT: i64 = 10;

/// Columns selected for a full [`StoreRow`].
macro_rules! store_columns {
    () => {
        "id, name, slug, description, tags, created, lng, lat, address, photo, author_id"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    slug: String,
    description: String,
    tags: Vec<String>,
    created: DateTime<Utc>,
    lng: f64,
    lat: f64,
    address: String,
    photo: Option<String>,
    author_id: UserId,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("store {} slug {:?}: {e}", row.id, row.slug))
        })?;
        let point = GeoPoint::new(row.lng, row.lat)
            .map_err(|e| RepositoryError::DataCorruption(format!("store {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug,
            description: row.description,
            tags: row.tags,
            created: row.created,
            location: Location::point(point, row.address),
            photo: row.photo,
            author: row.author_id,
        })
    }
}

/// Internal row type for the geo projection.
#[derive(Debug, sqlx::FromRow)]
struct NearbyRow {
    slug: String,
    name: String,
    description: String,
    lng: f64,
    lat: f64,
    address: String,
    photo: Option<String>,
}

impl TryFrom<NearbyRow> for NearbyStore {
    type Error = RepositoryError;

    fn try_from(row: NearbyRow) -> Result<Self, Self::Error> {
        let point = GeoPoint::new(row.lng, row.lat)
            .map_err(|e| RepositoryError::DataCorruption(format!("store {}: {e}", row.slug)))?;
        Ok(Self {
            slug: parse_slug(&row.slug)?,
            name: row.name,
            description: row.description,
            location: Location::point(point, row.address),
            photo: row.photo,
        })
    }
}

/// Internal row type for text search results.
#[derive(Debug, sqlx::FromRow)]
struct SearchRow {
    slug: String,
    name: String,
    description: String,
    score: f32,
}

impl TryFrom<SearchRow> for SearchHit {
    type Error = RepositoryError;

    fn try_from(row: SearchRow) -> Result<Self, Self::Error> {
        Ok(Self {
            slug: parse_slug(&row.slug)?,
            name: row.name,
            description: row.description,
            score: row.score,
        })
    }
}

/// Internal row type for the top-rated aggregation.
#[derive(Debug, sqlx::FromRow)]
struct TopRow {
    slug: String,
    name: String,
    photo: Option<String>,
    review_count: i64,
    average_rating: f64,
}

impl TryFrom<TopRow> for TopStore {
    type Error = RepositoryError;

    fn try_from(row: TopRow) -> Result<Self, Self::Error> {
        Ok(Self {
            slug: parse_slug(&row.slug)?,
            name: row.name,
            photo: row.photo,
            rating: RatingSummary {
                review_count: row.review_count,
                average_rating: row.average_rating,
            },
        })
    }
}

/// Internal row type for the tag histogram.
#[derive(Debug, sqlx::FromRow)]
struct TagCountRow {
    tag: String,
    count: i64,
}

impl From<TagCountRow> for TagCount {
    fn from(row: TagCountRow) -> Self {
        Self {
            tag: row.tag,
            count: row.count,
        }
    }
}

fn parse_slug(slug: &str) -> Result<Slug, RepositoryError> {
    Slug::parse(slug).map_err(|e| RepositoryError::DataCorruption(format!("slug {slug:?}: {e}")))
}

fn into_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(Store::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Pick the slug for `name`, counting existing stores that share its base.
    ///
    /// `exclude` is the store being renamed, which must not count against
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the count query fails.
    pub async fn assign_slug(
        &self,
        name: &str,
        exclude: Option<StoreId>,
    ) -> Result<Slug, RepositoryError> {
        let base = Slug::from_name(name);
        let existing = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM stores
            WHERE slug ~* $1
              AND ($2::integer IS NULL OR id <> $2)
            ",
        )
        .bind(base.collision_pattern())
        .bind(exclude)
        .fetch_one(self.pool)
        .await?;

        Ok(base.with_collisions(existing))
    }

    /// Insert a validated store and assign its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the author does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip_all, fields(name = %store.name))]
    pub async fn create(&self, store: &ValidStore) -> Result<Store, RepositoryError> {
        let slug = self.assign_slug(&store.name, None).await?;
        let point = store.location.coordinates;

        let row = sqlx::query_as::<_, StoreRow>(concat!(
            r"
            INSERT INTO stores (name, slug, description, tags, lng, lat, address, photo, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING ",
            store_columns!()
        ))
        .bind(&store.name)
        .bind(slug.as_str())
        .bind(&store.description)
        .bind(store.tags.as_slice())
        .bind(point.lng())
        .bind(point.lat())
        .bind(&store.location.address)
        .bind(store.photo.as_deref())
        .bind(store.author)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        tracing::info!(slug = %slug, "Store created");
        row.try_into()
    }

    /// Apply an edit to an existing store.
    ///
    /// The slug is recomputed only when the name changed. A missing photo
    /// keeps the current one; the author never changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, store), fields(name = %store.name))]
    pub async fn update(&self, id: StoreId, store: &ValidStore) -> Result<Store, RepositoryError> {
        let current = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;
        let slug = if current.name == store.name {
            current.slug
        } else {
            self.assign_slug(&store.name, Some(id)).await?
        };
        let point = store.location.coordinates;

        let row = sqlx::query_as::<_, StoreRow>(concat!(
            r"
            UPDATE stores
            SET name = $2,
                slug = $3,
                description = $4,
                tags = $5,
                lng = $6,
                lat = $7,
                address = $8,
                photo = COALESCE($9, photo)
            WHERE id = $1
            RETURNING ",
            store_columns!()
        ))
        .bind(id)
        .bind(&store.name)
        .bind(slug.as_str())
        .bind(&store.description)
        .bind(store.tags.as_slice())
        .bind(point.lng())
        .bind(point.lat())
        .bind(&store.location.address)
        .bind(store.photo.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// Get a store by slug with its author and reviews resolved.
    ///
    /// Returns `Ok(None)` when no store has this slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the author row is missing.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<StoreDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores WHERE slug = $1 ORDER BY id LIMIT 1"
        ))
        .bind(slug.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let store = Store::try_from(row)?;

        let users = UserRepository::new(self.pool);
        let reviews = ReviewRepository::new(self.pool);
        let (author, reviews) = tokio::try_join!(
            users.get_by_id(store.author),
            reviews.list_for_store(store.id)
        )?;
        let author = author.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "store {} references missing author {}",
                store.id, store.author
            ))
        })?;

        Ok(Some(StoreDetail {
            store,
            author: author.into(),
            reviews,
        }))
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// One page of stores, newest first, plus the total count.
    ///
    /// The page query and the count run concurrently.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_page(&self, pagination: Pagination) -> Result<StorePage, RepositoryError> {
        let stores = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores ORDER BY created DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool);
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stores").fetch_one(self.pool);

        let (rows, count) = tokio::try_join!(stores, count)?;
        Ok(StorePage::new(into_stores(rows)?, pagination, count))
    }

    /// Tag histogram over all stores: count descending, ties by tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_list(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagCountRow>(
            r"
            SELECT tag, COUNT(*) AS count
            FROM stores, unnest(tags) AS tag
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Stores carrying `tag`, or every tagged store when `tag` is `None`,
    /// together with the tag histogram.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_by_tag(&self, tag: Option<&str>) -> Result<TagListing, RepositoryError> {
        let stores = async {
            let rows = sqlx::query_as::<_, StoreRow>(concat!(
                "SELECT ",
                store_columns!(),
                r"
                FROM stores
                WHERE CASE
                    WHEN $1::text IS NULL THEN cardinality(tags) > 0
                    ELSE $1 = ANY(tags)
                END
                ORDER BY created DESC, id DESC
                "
            ))
            .bind(tag)
            .fetch_all(self.pool)
            .await?;
            into_stores(rows)
        };

        let (tags, stores) = tokio::try_join!(self.tag_list(), stores)?;
        Ok(TagListing { tags, stores })
    }

    /// Stores the user has hearted, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearted(&self, user: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            r"
            FROM stores
            WHERE id IN (SELECT store_id FROM user_hearts WHERE user_id = $1)
            ORDER BY created DESC, id DESC
            "
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Full-text search over name and description, best match first.
    ///
    /// A blank query returns no results without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RepositoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SearchRow>(
            r"
            SELECT slug, name, description, ts_rank(search, q) AS score
            FROM stores, websearch_to_tsquery('english', $1) AS q
            WHERE search @@ q
            ORDER BY score DESC, id
            LIMIT $2
            ",
        )
        .bind(query)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SearchHit::try_from).collect()
    }

    /// Stores within [`NEAR_RADIUS_METERS`] of `point`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn near(&self, point: GeoPoint) -> Result<Vec<NearbyStore>, RepositoryError> {
        let rows = sqlx::query_as::<_, NearbyRow>(
            r"
            SELECT slug, name, description, lng, lat, address, photo
            FROM stores
            WHERE earth_box(ll_to_earth($2, $1), $3) @> ll_to_earth(lat, lng)
              AND earth_distance(ll_to_earth($2, $1), ll_to_earth(lat, lng)) <= $3
            ORDER BY earth_distance(ll_to_earth($2, $1), ll_to_earth(lat, lng)), id
            LIMIT $4
            ",
        )
        .bind(point.lng())
        .bind(point.lat())
        .bind(NEAR_RADIUS_METERS)
        .bind(NEAR_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(NearbyStore::try_from).collect()
    }

    /// Highest average rating first, among stores with enough reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_stores(&self) -> Result<Vec<TopStore>, RepositoryError> {
        let rows = sqlx::query_as::<_, TopRow>(
            r"
            SELECT s.slug, s.name, s.photo,
                   COUNT(r.id) AS review_count,
                   AVG(r.rating)::float8 AS average_rating
            FROM stores s
            JOIN reviews r ON r.store_id = s.id
            GROUP BY s.id
            HAVING COUNT(r.id) >= $1
            ORDER BY average_rating DESC, review_count DESC, s.id
            LIMIT $2
            ",
        )
        .bind(RatingSummary::MIN_REVIEWS_FOR_TOP)
        .bind(TOP_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TopStore::try_from).collect()
    }
}
