//! Domain models for the web crate.
//!
//! Pure value types (ids, slugs, locations, validation) live in
//! `delicious-core`; these are the read models the repositories return and
//! the templates render.

pub mod review;
pub mod session;
pub mod store;
pub mod user;

pub use review::Review;
pub use session::{CurrentUser, session_keys};
pub use store::{NearbyStore, SearchHit, Store, StoreDetail, StorePage, TagListing, TopStore};
pub use user::{Author, User};
