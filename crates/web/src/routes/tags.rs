//! Tag browsing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use delicious_core::TagCount;

use super::PageContext;
use super::stores::{StoreCard, viewer_hearts};
use crate::db::StoreRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// A tag in the histogram, linked to its filter page.
#[derive(Debug, Clone)]
pub struct TagLink {
    pub tag: String,
    pub count: i64,
    pub href: String,
    pub active: bool,
}

impl TagLink {
    fn new(tag: TagCount, active: Option<&str>) -> Self {
        Self {
            href: format!("/tags/{}", urlencoding::encode(&tag.tag)),
            active: active == Some(tag.tag.as_str()),
            tag: tag.tag,
            count: tag.count,
        }
    }
}

/// Tag filter page.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub tags: Vec<TagLink>,
    pub cards: Vec<StoreCard>,
}

/// `GET /tags`: every tagged store.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<Response> {
    render(&state, ctx, None).await
}

/// `GET /tags/{tag}`: stores carrying one tag.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    ctx: PageContext,
) -> Result<Response> {
    render(&state, ctx, Some(tag.as_str())).await
}

async fn render(state: &AppState, ctx: PageContext, tag: Option<&str>) -> Result<Response> {
    let repo = StoreRepository::new(state.pool());
    let (listing, hearts) = tokio::try_join!(
        async { repo.list_by_tag(tag).await.map_err(AppError::from) },
        viewer_hearts(state, &ctx)
    )?;

    let viewer = ctx.user.as_ref().map(|u| u.id);
    Ok(TagsTemplate {
        title: tag.unwrap_or("Tags").to_string(),
        tags: listing
            .tags
            .into_iter()
            .map(|t| TagLink::new(t, tag))
            .collect(),
        cards: StoreCard::for_viewer(listing.stores, viewer, &hearts),
        ctx,
    }
    .into_response())
}
