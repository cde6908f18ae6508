//! Integration tests for Delicious.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a scratch database
//! cargo run -p delicious-cli -- migrate
//! cargo run -p delicious-cli -- seed
//!
//! # Start the server, then run the ignored tests
//! cargo run -p delicious-web &
//! cargo test -p delicious-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `web_pages` - HTML routes over HTTP
//! - `web_api` - JSON API over HTTP
//! - `store_repository` - Repository queries against a migrated database

use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use sqlx::PgPool;

/// Base URL of the running web server (`DELICIOUS_BASE_URL`).
#[must_use]
pub fn web_base_url() -> String {
    std::env::var("DELICIOUS_BASE_URL").unwrap_or_else(|_| "http://localhost:7777".to_string())
}

/// HTTP client that keeps cookies and does not follow redirects.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// Pool for the migrated test database (`DELICIOUS_DATABASE_URL`).
///
/// # Panics
///
/// Panics if the variable is missing or the database is unreachable.
#[allow(clippy::expect_used)]
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DELICIOUS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("DELICIOUS_DATABASE_URL must be set");
    delicious_web::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// A name no other test run will have picked.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix} {}", id.get(..8).unwrap_or(&id))
}
