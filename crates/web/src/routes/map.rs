//! Map page. The browser fills it from `/api/stores/near`.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::{IntoResponse, Response};

use super::PageContext;

/// Map page.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub ctx: PageContext,
}

/// `GET /map`
pub async fn index(ctx: PageContext) -> Response {
    MapTemplate { ctx }.into_response()
}
