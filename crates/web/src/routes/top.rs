//! Top rated stores.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::PageContext;
use crate::db::StoreRepository;
use crate::error::Result;
use crate::models::TopStore;
use crate::state::AppState;

/// Top stores page.
#[derive(Template, WebTemplate)]
#[template(path = "top.html")]
pub struct TopTemplate {
    pub ctx: PageContext,
    pub stores: Vec<TopStore>,
}

/// `GET /top`
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<Response> {
    let stores = StoreRepository::new(state.pool()).top_stores().await?;
    Ok(TopTemplate { ctx, stores }.into_response())
}
