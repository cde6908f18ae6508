//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! cookie is signed with a key derived from `DELICIOUS_SESSION_SECRET`.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::WebConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "dtd_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Derive the cookie signing key from the session secret.
///
/// `Key` needs 64 bytes; SHA-512 of the validated secret gives exactly that.
#[must_use]
pub fn signing_key(config: &WebConfig) -> Key {
    let digest = Sha512::digest(config.session_secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer with `PostgreSQL` store.
///
/// The sessions table is created by the migrations, not at startup.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &WebConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use secrecy::SecretString;
    use tower_sessions::cookie::{Cookie, CookieJar};

    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_signing_key_follows_secret() {
        let config = test_config(PathBuf::from("uploads"));
        assert_eq!(signing_key(&config).master(), signing_key(&config).master());

        let mut rotated = config.clone();
        rotated.session_secret = SecretString::from("Zr5!kP8@wQ2#mT6$yH1%cV9^nB4&xL7*");
        assert_ne!(signing_key(&config).master(), signing_key(&rotated).master());
    }

    #[test]
    fn test_cookie_signed_with_one_secret_fails_under_another() {
        let config = test_config(PathBuf::from("uploads"));
        let mut rotated = config.clone();
        rotated.session_secret = SecretString::from("Zr5!kP8@wQ2#mT6$yH1%cV9^nB4&xL7*");

        let mut jar = CookieJar::new();
        jar.signed_mut(&signing_key(&config))
            .add(Cookie::new(SESSION_COOKIE_NAME, "session-id"));
        let signed = jar.get(SESSION_COOKIE_NAME).unwrap().clone();
        assert_ne!(signed.value(), "session-id");

        let mut verify = CookieJar::new();
        verify.add_original(signed);
        assert_eq!(
            verify
                .signed(&signing_key(&config))
                .get(SESSION_COOKIE_NAME)
                .unwrap()
                .value(),
            "session-id"
        );
        assert!(verify.signed(&signing_key(&rotated)).get(SESSION_COOKIE_NAME).is_none());
    }
}
