//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::WebConfig;
use crate::services::PhotoService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    pool: PgPool,
    photos: PhotoService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Web configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: WebConfig, pool: PgPool) -> Self {
        let photos = PhotoService::new(config.uploads_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                photos,
            }),
        }
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the photo ingestion service.
    #[must_use]
    pub fn photos(&self) -> &PhotoService {
        &self.inner.photos
    }
}
