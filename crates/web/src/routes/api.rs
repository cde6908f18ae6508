//! JSON endpoints used by the search box, the map and the heart buttons.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use delicious_core::{GeoPoint, HeartAction, Hearts, StoreId};

use crate::db::{HeartRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{NearbyStore, SearchHit};
use crate::state::AppState;

/// `?q=` for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// `?lng=&lat=` for the geo endpoint. Kept as text so bad values get our
/// own 400 message.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lng: Option<String>,
    pub lat: Option<String>,
}

impl NearQuery {
    /// Parse and range-check the coordinates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if either coordinate is missing, not a
    /// number or out of range.
    pub fn point(&self) -> Result<GeoPoint> {
        let lng = parse_coordinate("lng", self.lng.as_deref())?;
        let lat = parse_coordinate("lat", self.lat.as_deref())?;
        GeoPoint::new(lng, lat).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

fn parse_coordinate(name: &str, value: Option<&str>) -> Result<f64> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))?;
    value
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("{name} must be a number")))
}

/// Body of a heart toggle response.
#[derive(Debug, Serialize)]
pub struct HeartResponse {
    pub action: HeartAction,
    pub hearts: Hearts,
}

/// `GET /api/search?q=`: up to five stores, best match first.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>> {
    let q = query.q.unwrap_or_default();
    let hits = StoreRepository::new(state.pool()).search(&q).await?;
    Ok(Json(hits))
}

/// `GET /api/stores/near?lng=&lat=`: stores within 10 km, nearest first.
#[instrument(skip(state))]
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<NearbyStore>>> {
    let point = query.point()?;
    let stores = StoreRepository::new(state.pool()).near(point).await?;
    Ok(Json(stores))
}

/// `POST /api/stores/{id}/heart`: toggle the store in the user's hearts.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn heart(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<HeartResponse>> {
    let (action, hearts) = HeartRepository::new(state.pool())
        .toggle(user.id, id)
        .await?;
    Ok(Json(HeartResponse { action, hearts }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(lng: Option<&str>, lat: Option<&str>) -> NearQuery {
        NearQuery {
            lng: lng.map(String::from),
            lat: lat.map(String::from),
        }
    }

    #[test]
    fn test_near_query_parses_point() {
        let point = query(Some("-0.09"), Some(" 51.5 ")).point().unwrap();
        assert!((point.lng() - -0.09).abs() < f64::EPSILON);
        assert!((point.lat() - 51.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_near_query_rejects_bad_input() {
        for q in [
            query(None, Some("51.5")),
            query(Some("-0.09"), Some("")),
            query(Some("west"), Some("51.5")),
            query(Some("-0.09"), Some("95")),
        ] {
            assert!(matches!(q.point(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_heart_response_shape() {
        let hearts: Hearts = [StoreId::new(3), StoreId::new(1)].into_iter().collect();
        let body = serde_json::to_value(HeartResponse {
            action: HeartAction::Added,
            hearts,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"action": "added", "hearts": [1, 3]}));
    }
}
