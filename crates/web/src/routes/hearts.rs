//! The logged-in user's hearted stores.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::PageContext;
use super::stores::StoreCard;
use crate::db::{HeartRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Hearted stores page.
#[derive(Template, WebTemplate)]
#[template(path = "hearts.html")]
pub struct HeartsTemplate {
    pub ctx: PageContext,
    pub cards: Vec<StoreCard>,
}

/// `GET /hearts`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let stores = StoreRepository::new(state.pool());
    let hearts = HeartRepository::new(state.pool());
    let (stores, hearts) = tokio::try_join!(
        async { stores.hearted(user.id).await.map_err(AppError::from) },
        async { hearts.hearts_for(user.id).await.map_err(AppError::from) }
    )?;

    Ok(HeartsTemplate {
        cards: StoreCard::for_viewer(stores, Some(user.id), &hearts),
        ctx,
    }
    .into_response())
}
