//! Favorites ("hearts") database operations.

use sqlx::PgPool;

use delicious_core::{HeartAction, Hearts, StoreId, UserId};

use super::RepositoryError;

/// Repository for the `user_hearts` join table.
pub struct HeartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HeartRepository<'a> {
    /// Create a new heart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store ids the user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearts_for(&self, user: UserId) -> Result<Hearts, RepositoryError> {
        let ids = sqlx::query_scalar::<_, StoreId>(
            "SELECT store_id FROM user_hearts WHERE user_id = $1",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    /// Heart the store if it is not hearted yet, otherwise un-heart it.
    ///
    /// The delete-or-insert is a single statement; two concurrent toggles
    /// never leave a duplicate row. Returns what happened and the user's
    /// hearts afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or user does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self))]
    pub async fn toggle(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<(HeartAction, Hearts), RepositoryError> {
        let removed = sqlx::query_scalar::<_, bool>(
            r"
            WITH removed AS (
                DELETE FROM user_hearts
                WHERE user_id = $1 AND store_id = $2
                RETURNING store_id
            ),
            added AS (
                INSERT INTO user_hearts (user_id, store_id)
                SELECT $1, $2
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT DO NOTHING
                RETURNING store_id
            )
            SELECT EXISTS (SELECT 1 FROM removed)
            ",
        )
        .bind(user)
        .bind(store)
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

        let action = if removed {
            HeartAction::Removed
        } else {
            HeartAction::Added
        };
        tracing::info!(?action, "Heart toggled");

        let hearts = self.hearts_for(user).await?;
        Ok((action, hearts))
    }
}
