//! Store listing, detail and add/edit handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use delicious_core::{
    Hearts, Pagination, RatingSummary, Slug, StoreId, StoreValidationError, UserId, ensure_owner,
};

use super::PageContext;
use super::form::{FormValues, StoreForm};
use crate::db::{HeartRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::{Flash, RequireAuth, push_flash};
use crate::models::{Store, StoreDetail, StorePage};
use crate::state::AppState;

/// A store as shown on a listing card.
#[derive(Debug, Clone)]
pub struct StoreCard {
    pub store: Store,
    pub hearted: bool,
    pub owned: bool,
}

impl StoreCard {
    /// Build cards for `stores` from the viewer's perspective.
    #[must_use]
    pub fn for_viewer(stores: Vec<Store>, viewer: Option<UserId>, hearts: &Hearts) -> Vec<Self> {
        stores
            .into_iter()
            .map(|store| Self {
                hearted: hearts.contains(store.id),
                owned: store.is_owned_by(viewer),
                store,
            })
            .collect()
    }
}

/// The viewer's hearts, or none for anonymous visitors.
pub async fn viewer_hearts(state: &AppState, ctx: &PageContext) -> Result<Hearts> {
    match &ctx.user {
        Some(user) => Ok(HeartRepository::new(state.pool()).hearts_for(user.id).await?),
        None => Ok(Hearts::default()),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Paginated store listing.
#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub ctx: PageContext,
    pub cards: Vec<StoreCard>,
    pub page: StorePage,
}

/// Store detail page.
#[derive(Template, WebTemplate)]
#[template(path = "store.html")]
pub struct StoreTemplate {
    pub ctx: PageContext,
    pub detail: StoreDetail,
    pub rating: Option<RatingSummary>,
    pub static_map_url: Option<String>,
    pub hearted: bool,
    pub owned: bool,
}

/// Add or edit form.
#[derive(Template, WebTemplate)]
#[template(path = "edit_store.html")]
pub struct EditStoreTemplate {
    pub ctx: PageContext,
    pub title: String,
    /// Form `action` URL.
    pub action: String,
    pub form: FormValues,
    /// Current photo, when editing a store that has one.
    pub photo_url: Option<String>,
}

/// Re-render the form with the submitted values and every validation error.
fn invalid_form(
    ctx: PageContext,
    title: String,
    action: String,
    form: FormValues,
    errors: &StoreValidationError,
) -> Response {
    let ctx = ctx.with_flashes(errors.messages().into_iter().map(Flash::error));
    let template = EditStoreTemplate {
        ctx,
        title,
        action,
        form,
        photo_url: None,
    };
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}

fn static_map_url(store: &Store, key: &str) -> String {
    let point = store.location.coordinates;
    let center = format!("{},{}", point.lat(), point.lng());
    format!(
        "https://maps.googleapis.com/maps/api/staticmap?center={center}&zoom=14&size=800x150&markers={center}&scale=2&key={}",
        urlencoding::encode(key)
    )
}

// =============================================================================
// Listing
// =============================================================================

/// `GET /` and `GET /stores`: first page of stores.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<Response> {
    render_page(&state, &session, ctx, 1).await
}

/// `GET /stores/page/{page}`. Non-numeric pages are page 1.
#[instrument(skip(state, session, ctx))]
pub async fn page(
    State(state): State<AppState>,
    Path(page): Path<String>,
    session: Session,
    ctx: PageContext,
) -> Result<Response> {
    let page = page.trim().parse::<u32>().unwrap_or(1);
    render_page(&state, &session, ctx, page).await
}

async fn render_page(
    state: &AppState,
    session: &Session,
    ctx: PageContext,
    page: u32,
) -> Result<Response> {
    let pagination = Pagination::stores(page);
    let repo = StoreRepository::new(state.pool());
    let (mut listing, hearts) = tokio::try_join!(
        async { repo.list_page(pagination).await.map_err(AppError::from) },
        viewer_hearts(state, &ctx)
    )?;

    if listing.is_past_end(pagination) {
        let last = listing.pages.max(1);
        ctx.requeue_flashes(session).await?;
        push_flash(
            session,
            Flash::info(format!(
                "Hey! You asked for page {}. But that doesn't exist. So you are being redirected to page {last}",
                pagination.page()
            )),
        )
        .await?;
        return Ok(Redirect::to(&format!("/stores/page/{last}")).into_response());
    }

    let viewer = ctx.user.as_ref().map(|u| u.id);
    let stores = std::mem::take(&mut listing.stores);
    let cards = StoreCard::for_viewer(stores, viewer, &hearts);
    Ok(StoresTemplate {
        ctx,
        cards,
        page: listing,
    }
    .into_response())
}

/// `GET /store/{slug}`: store detail or 404.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ctx: PageContext,
) -> Result<Response> {
    let not_found = || AppError::NotFound(format!("store {slug}"));
    let slug = Slug::parse(&slug).map_err(|_| not_found())?;

    let (detail, hearts) = tokio::try_join!(
        async {
            StoreRepository::new(state.pool())
                .get_by_slug(&slug)
                .await
                .map_err(AppError::from)
        },
        viewer_hearts(&state, &ctx)
    )?;
    let detail = detail.ok_or_else(not_found)?;

    let viewer = ctx.user.as_ref().map(|u| u.id);
    let static_map_url = ctx
        .map_key
        .as_deref()
        .map(|key| static_map_url(&detail.store, key));

    Ok(StoreTemplate {
        hearted: hearts.contains(detail.store.id),
        owned: detail.store.is_owned_by(viewer),
        rating: detail.rating(),
        static_map_url,
        detail,
        ctx,
    }
    .into_response())
}

// =============================================================================
// Add / Edit
// =============================================================================

/// `GET /add`: blank form.
#[instrument(skip_all)]
pub async fn add_form(RequireAuth(_user): RequireAuth, ctx: PageContext) -> Response {
    EditStoreTemplate {
        ctx,
        title: "Add Store".to_string(),
        action: "/add".to_string(),
        form: FormValues::empty(),
        photo_url: None,
    }
    .into_response()
}

/// `GET /stores/{id}/edit`: form for the store's owner.
#[instrument(skip(state, user, ctx))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let store = StoreRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;
    ensure_owner(store.author, user.id)?;

    Ok(EditStoreTemplate {
        ctx,
        title: format!("Edit {}", store.name),
        action: format!("/add/{id}"),
        form: FormValues::from(&store),
        photo_url: store.photo.is_some().then(|| store.photo_url()),
    }
    .into_response())
}

/// Validate, attach the photo and persist. `id` is the store being edited.
async fn save_store(state: &AppState, id: Option<StoreId>, form: StoreForm) -> Result<Store> {
    let mut store = form.input.validate()?;
    store.photo = state.photos().ingest(form.photo).await?;

    let repo = StoreRepository::new(state.pool());
    let saved = match id {
        Some(id) => repo.update(id, &store).await?,
        None => repo.create(&store).await?,
    };
    Ok(saved)
}

/// `POST /add`: create a store and go to its page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    ctx: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = StoreForm::from_multipart(multipart).await?;
    form.input.author = Some(user.id);
    let submitted = FormValues::from(&form.input);

    match save_store(&state, None, form).await {
        Ok(store) => {
            ctx.requeue_flashes(&session).await?;
            push_flash(
                &session,
                Flash::success(format!(
                    "Successfully Created {}. Care to leave a review?",
                    store.name
                )),
            )
            .await?;
            Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
        }
        Err(AppError::Validation(errors)) => Ok(invalid_form(
            ctx,
            "Add Store".to_string(),
            "/add".to_string(),
            submitted,
            &errors,
        )),
        Err(e) => Err(e),
    }
}

/// `POST /add/{id}`: apply an edit from the store's owner.
#[instrument(skip(state, user, session, ctx, multipart), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    RequireAuth(user): RequireAuth,
    session: Session,
    ctx: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    let current = StoreRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;
    ensure_owner(current.author, user.id)?;

    let mut form = StoreForm::from_multipart(multipart).await?;
    form.input.author = Some(current.author);
    let submitted = FormValues::from(&form.input);

    match save_store(&state, Some(id), form).await {
        Ok(store) => {
            ctx.requeue_flashes(&session).await?;
            push_flash(
                &session,
                Flash::success(format!("Successfully updated {}. View Store →", store.name))
                    .with_link(format!("/store/{}", store.slug)),
            )
            .await?;
            Ok(Redirect::to(&format!("/stores/{id}/edit")).into_response())
        }
        Err(AppError::Validation(errors)) => Ok(invalid_form(
            ctx,
            format!("Edit {}", current.name),
            format!("/add/{id}"),
            submitted,
            &errors,
        )),
        Err(e) => Err(e),
    }
}
