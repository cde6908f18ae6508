//! Per-request data every page template needs.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::{Flash, OptionalAuth, take_flashes};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Layout context: who is logged in, pending flashes and the map key.
///
/// Extracting this drains the session's flashes, so a handler that redirects
/// instead of rendering should call [`PageContext::requeue_flashes`].
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
    pub map_key: Option<String>,
}

impl PageContext {
    /// Add flashes raised while handling this request.
    #[must_use]
    pub fn with_flashes(mut self, flashes: impl IntoIterator<Item = Flash>) -> Self {
        self.flashes.extend(flashes);
        self
    }

    /// Put the drained flashes back for the next render.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn requeue_flashes(
        self,
        session: &Session,
    ) -> Result<(), tower_sessions::session::Error> {
        for flash in self.flashes {
            crate::middleware::push_flash(session, flash).await?;
        }
        Ok(())
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;

        let flashes = match parts.extensions.get::<Session>() {
            Some(session) => take_flashes(session).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read flashes");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(Self {
            user,
            flashes,
            map_key: state.config().map_key.clone(),
        })
    }
}
