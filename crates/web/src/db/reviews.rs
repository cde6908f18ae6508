//! Review database operations.
//!
//! Reviews are a back-reference from stores: always queried by `store_id`,
//! never stored on the store row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::{ReviewId, StoreId, UserId};

use super::RepositoryError;
use crate::models::{Author, Review};

/// Internal row type for reviews joined to their author.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    store_id: StoreId,
    author_id: UserId,
    author_name: String,
    rating: i16,
    text: String,
    created: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            store: row.store_id,
            author: Author {
                id: row.author_id,
                name: row.author_name,
            },
            rating: row.rating,
            text: row.text,
            created: row.created,
        }
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All reviews of a store with authors resolved, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(&self, store: StoreId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.store_id, r.author_id, u.name AS author_name,
                   r.rating, r.text, r.created
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.store_id = $1
            ORDER BY r.created DESC, r.id DESC
            ",
        )
        .bind(store)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a review. Used by the seeder; review authoring lives elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or author does not
    /// exist, `RepositoryError::Conflict` if the rating is outside 1 to 5.
    pub async fn create(
        &self,
        store: StoreId,
        author: UserId,
        rating: i16,
        text: &str,
    ) -> Result<ReviewId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ReviewId>(
            r"
            INSERT INTO reviews (store_id, author_id, rating, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(store)
        .bind(author)
        .bind(rating)
        .bind(text)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
                if db_err.is_check_violation() {
                    return RepositoryError::Conflict(format!("rating out of range: {rating}"));
                }
            }
            RepositoryError::Database(e)
        })?;

        Ok(id)
    }
}
