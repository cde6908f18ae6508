//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use delicious_core::UserId;

/// Session-stored user identity.
///
/// Written by the identity provider on login; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: String,
}

/// Session keys for stored values.
pub mod session_keys {
    /// Key for the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}
