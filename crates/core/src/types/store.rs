//! Store input validation and ownership rules.

use core::fmt;

use crate::types::geo::{GeoError, GeoPoint, Location};
use crate::types::id::UserId;

/// Tag choices offered on the add/edit form.
pub const TAG_CHOICES: &[&str] = &[
    "Wifi",
    "Open Late",
    "Family Friendly",
    "Vegetarian",
    "Licensed",
];

/// A single failed field rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StoreFieldError {
    #[error("Please enter a store name!")]
    MissingName,
    #[error("You must supply coordinates!")]
    MissingCoordinates,
    #[error("You must supply an address!")]
    MissingAddress,
    #[error("You must supply an author")]
    MissingAuthor,
    #[error("{0}")]
    Coordinates(#[from] GeoError),
}

/// All field rules a store submission failed, in form order.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreValidationError {
    errors: Vec<StoreFieldError>,
}

impl StoreValidationError {
    /// The individual field failures.
    #[must_use]
    pub fn errors(&self) -> &[StoreFieldError] {
        &self.errors
    }

    /// User-facing messages, one per failed rule.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for StoreValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(" "))
    }
}

impl std::error::Error for StoreValidationError {}

/// Raw store submission as it arrives from a form or seed file.
///
/// Nothing here is trusted: strings are untrimmed and coordinates may be
/// missing. Call [`StoreInput::validate`] before persisting.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct StoreInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub address: String,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub photo: Option<String>,
    pub author: Option<UserId>,
}

/// A store submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidStore {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: UserId,
}

impl StoreInput {
    /// Trim, normalize and check the required fields.
    ///
    /// Tags are trimmed, blanks dropped and duplicates collapsed keeping the
    /// first occurrence.
    ///
    /// # Errors
    ///
    /// Returns every failed rule at once so the form can show all of them.
    pub fn validate(self) -> Result<ValidStore, StoreValidationError> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.push(StoreFieldError::MissingName);
        }

        let coordinates = match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => match GeoPoint::new(lng, lat) {
                Ok(point) => Some(point),
                Err(e) => {
                    errors.push(e.into());
                    None
                }
            },
            _ => {
                errors.push(StoreFieldError::MissingCoordinates);
                None
            }
        };

        let address = self.address.trim().to_owned();
        if address.is_empty() {
            errors.push(StoreFieldError::MissingAddress);
        }

        if self.author.is_none() {
            errors.push(StoreFieldError::MissingAuthor);
        }

        let (Some(coordinates), Some(author), true) = (coordinates, self.author, errors.is_empty())
        else {
            return Err(StoreValidationError { errors });
        };

        Ok(ValidStore {
            name,
            description: self.description.trim().to_owned(),
            tags: normalize_tags(self.tags),
            location: Location::point(coordinates, address),
            photo: self.photo.filter(|p| !p.trim().is_empty()),
            author,
        })
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_owned());
        }
    }
    out
}

/// Returned when someone other than the author tries to edit a store.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("You must own a store in order to edit it!")]
pub struct OwnershipError;

/// Check that `user` authored the store.
///
/// # Errors
///
/// Returns [`OwnershipError`] when the ids differ.
pub fn ensure_owner(author: UserId, user: UserId) -> Result<(), OwnershipError> {
    if author == user {
        Ok(())
    } else {
        Err(OwnershipError)
    }
}
