//! Geolocation types.
//!
//! Stores carry a GeoJSON-style point. Coordinates are ordered
//! `[longitude, latitude]` on the wire, matching GeoJSON and the map client.

use serde::{Deserialize, Serialize};

/// GeoJSON geometry type for a store location.
pub const POINT: &str = "Point";

/// Radius used by the earthdistance extension (`earth()`), in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_168.0;

/// Errors that can occur when building a [`GeoPoint`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude must be between -180 and 180 (got {0})")]
    Longitude(f64),
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude must be between -90 and 90 (got {0})")]
    Latitude(f64),
}

/// A point on the earth's surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct GeoPoint {
    lng: f64,
    lat: f64,
}

impl GeoPoint {
    /// Create a point from longitude and latitude in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is out of range or not finite.
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Great-circle distance to `other` in meters (haversine).
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lng, point.lat]
    }
}

impl TryFrom<[f64; 2]> for GeoPoint {
    type Error = GeoError;

    fn try_from([lng, lat]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(lng, lat)
    }
}

/// A store location: a point plus the human-readable address.
///
/// Serializes as `{"type": "Point", "coordinates": [lng, lat], "address": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Always [`POINT`].
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    /// `[longitude, latitude]`.
    pub coordinates: GeoPoint,
    /// Street address as entered.
    pub address: String,
}

impl Location {
    /// Create a point location.
    #[must_use]
    pub fn point(coordinates: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            kind: point_type(),
            coordinates,
            address: address.into(),
        }
    }
}

fn point_type() -> String {
    POINT.to_owned()
}
