//! Delicious Core - Shared domain types.
//!
//! This crate provides the types and pure rules used by the other Delicious
//! crates:
//! - `web` - The store directory HTTP server
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and logic - no I/O, no database access,
//! no HTTP. Slug derivation, store validation, pagination arithmetic and the
//! favorites set live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, slugs, geolocation, store input, pagination,
//!   ratings and hearts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
