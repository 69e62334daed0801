//! Anonymous session identity.
//!
//! Every visitor gets an opaque identifier carried in a signed cookie. The
//! identifier is what the cart tables are keyed by; there are no shopper
//! accounts.
//!
//! # Cookie
//!
//! - Name: `w4w_session`
//! - Value: 32 bytes from the OS CSPRNG, base64 URL-safe (padded), signed
//!   with HMAC-SHA256 by the `tower-cookies` signed jar
//! - Flags: `HttpOnly`, `SameSite=Lax`, `Path=/`, 7 day max-age, `Secure` in
//!   production
//!
//! A cookie whose signature does not verify is ignored and a fresh identifier
//! is issued, which means a fresh, empty cart.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::URL_SAFE};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha512};
use thiserror::Error;
use tower_cookies::{
    Cookie, Cookies, Key,
    cookie::{SameSite, time::Duration},
};
use tracing::{Span, debug};

use crate::error::AppError;
use crate::models::SessionId;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "w4w_session";

/// Session cookie lifetime.
const SESSION_MAX_AGE_DAYS: i64 = 7;

/// Random bytes per session identifier.
const SESSION_ID_BYTES: usize = 32;

/// Errors issuing a session identifier.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operating system's randomness source failed.
    #[error("randomness source unavailable: {0}")]
    Entropy(String),
}

/// Derive the cookie signing key from the configured session secret.
///
/// The signed jar needs 64 bytes of key material; SHA-512 stretches any
/// validated secret to exactly that.
#[must_use]
pub fn derive_cookie_key(secret: &[u8]) -> Key {
    Key::from(Sha512::digest(secret).as_slice())
}

/// Generate a new session identifier.
///
/// # Errors
///
/// Returns `SessionError::Entropy` if the OS random number generator fails.
/// An empty or predictable identifier is never returned.
pub fn generate_session_id() -> Result<SessionId, SessionError> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::Entropy(e.to_string()))?;
    Ok(SessionId::new(URL_SAFE.encode(bytes)))
}

/// Build the session cookie for an identifier.
#[must_use]
pub fn session_cookie(id: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, id.as_str().to_owned()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(SESSION_MAX_AGE_DAYS))
        .build()
}

/// Middleware that resolves the visitor's session identifier.
///
/// Reads the signed session cookie or issues a new one, then:
/// 1. Inserts the [`SessionId`] into request extensions for the extractor
/// 2. Records a short prefix of it on the current tracing span
///
/// Requires `CookieManagerLayer` to be applied outside this middleware.
pub async fn session_identity_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let session = {
        let jar = cookies.signed(state.cookie_key());
        match jar.get(SESSION_COOKIE_NAME) {
            Some(cookie) if !cookie.value().is_empty() => SessionId::new(cookie.value()),
            _ => match generate_session_id() {
                Ok(id) => {
                    jar.add(session_cookie(&id, state.config().secure_cookies()));
                    debug!(session = id.short(), "Issued new session");
                    id
                }
                Err(e) => return AppError::Internal(e.to_string()).into_response(),
            },
        }
    };

    Span::current().record("session", session.short());
    request.extensions_mut().insert(session);

    next.run(request).await
}

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::Internal("session identity middleware is not installed".to_string())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_decode_to_32_bytes() {
        let a = generate_session_id().unwrap();
        let b = generate_session_id().unwrap();

        assert_ne!(a, b);
        assert_eq!(URL_SAFE.decode(a.as_str()).unwrap().len(), SESSION_ID_BYTES);
        // 32 bytes -> 44 padded base64 characters
        assert_eq!(a.as_str().len(), 44);
    }

    #[test]
    fn test_cookie_flags() {
        let id = SessionId::new("abc");
        let cookie = session_cookie(&id, false);

        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
        assert!(!cookie.secure().unwrap_or(false));

        assert_eq!(session_cookie(&id, true).secure(), Some(true));
    }

    #[test]
    fn test_cookie_key_is_deterministic() {
        let a = derive_cookie_key(b"k3Y-for-tests-0123456789-abcdefgh");
        let b = derive_cookie_key(b"k3Y-for-tests-0123456789-abcdefgh");
        let c = derive_cookie_key(b"another-secret-0123456789-abcdefgh");

        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
