//! Remove all directory data.

use super::{CommandError, connect};

/// Truncate users, stores, reviews and hearts and reset their ids.
///
/// Sessions are left alone.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the truncate fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    sqlx::query("TRUNCATE user_hearts, reviews, stores, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await?;

    tracing::info!("All users, stores, reviews and hearts deleted");
    Ok(())
}
