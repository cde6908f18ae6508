//! Core types for the store directory.
//!
//! This module provides type-safe wrappers and pure rules for domain concepts.

pub mod geo;
pub mod hearts;
pub mod id;
pub mod page;
pub mod rating;
pub mod slug;
pub mod store;

pub use geo::{GeoError, GeoPoint, Location, POINT};
pub use hearts::{HeartAction, Hearts};
pub use id::*;
pub use page::Pagination;
pub use rating::{RatingSummary, TagCount};
pub use slug::{Slug, SlugError, slugify};
pub use store::{
    OwnershipError, StoreFieldError, StoreInput, StoreValidationError, TAG_CHOICES, ValidStore,
    ensure_owner,
};
