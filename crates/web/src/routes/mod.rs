//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Stores
//! GET  /                       - Store listing, page 1
//! GET  /stores                 - Store listing, page 1
//! GET  /stores/page/{page}     - Store listing, page N
//! GET  /store/{slug}           - Store detail
//! GET  /add                    - Add store form (auth)
//! POST /add                    - Create store, multipart (auth)
//! GET  /stores/{id}/edit       - Edit store form (auth + owner)
//! POST /add/{id}               - Update store, multipart (auth + owner)
//!
//! # Browsing
//! GET  /tags                   - All tagged stores with tag histogram
//! GET  /tags/{tag}             - Stores carrying a tag
//! GET  /top                    - Top rated stores
//! GET  /map                    - Map of nearby stores
//! GET  /hearts                 - Hearted stores (auth)
//!
//! # JSON API (rate limited)
//! GET  /api/search?q=          - Ranked text search
//! GET  /api/stores/near?lng=&lat= - Stores within 10 km
//! POST /api/stores/{id}/heart  - Toggle heart (auth)
//! ```

pub mod api;
pub mod context;
pub mod form;
pub mod health;
pub mod hearts;
pub mod map;
pub mod stores;
pub mod tags;
pub mod top;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

pub use context::PageContext;

use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(api::search))
        .route("/stores/near", get(api::near))
        .route("/stores/{id}/heart", post(api::heart))
        .layer(api_rate_limiter())
}

/// Create the multipart add/edit routes with their own body ceiling.
pub fn store_form_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/add", get(stores::add_form).post(stores::create))
        .route("/add/{id}", post(stores::update))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Build all application routes.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Stores
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::page))
        .route("/store/{slug}", get(stores::show))
        .merge(store_form_routes(max_upload_bytes))
        .route("/stores/{id}/edit", get(stores::edit_form))
        // Browsing
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/top", get(top::index))
        .route("/map", get(map::index))
        .route("/hearts", get(hearts::index))
        // JSON API
        .nest("/api", api_routes())
}
