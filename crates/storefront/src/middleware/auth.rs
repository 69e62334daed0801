//! Admin authentication extractor.
//!
//! Admin routes are protected with HTTP Basic Auth against the single
//! `ADMIN_USER` / `ADMIN_PASS` pair from configuration.

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderValue, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::ExposeSecret;
use tracing::warn;

use crate::config::AdminCredentials;
use crate::state::AppState;

/// Extractor that requires admin credentials.
///
/// Holds the authenticated username.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(username): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {username}!")
/// }
/// ```
pub struct RequireAdmin(pub String);

/// Error returned when admin credentials are missing or wrong.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// No usable `Authorization: Basic` header.
    MissingCredentials,
    /// Credentials did not match.
    InvalidCredentials,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        // Both cases get the same challenge so the browser prompts again.
        (
            StatusCode::UNAUTHORIZED,
            [(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="admin""#),
            )],
            "Unauthorized",
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (username, password) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_basic_auth)
            .ok_or(AdminAuthRejection::MissingCredentials)?;

        if !verify_admin(&state.config().admin, &username, &password) {
            warn!(username = %username, "Admin authentication failed");
            return Err(AdminAuthRejection::InvalidCredentials);
        }

        Ok(Self(username))
    }
}

/// Decode an `Authorization: Basic <base64(user:pass)>` header value.
fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_owned(), password.to_owned()))
}

/// Check both fields, without short-circuiting on the first mismatch.
fn verify_admin(expected: &AdminCredentials, username: &str, password: &str) -> bool {
    let user_ok = constant_time_compare(username, &expected.username);
    let pass_ok = constant_time_compare(password, expected.password.expose_secret());
    user_ok & pass_ok
}

/// Compare two strings without early exit on the first differing byte.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
