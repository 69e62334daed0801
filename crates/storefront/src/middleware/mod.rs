//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. Rate limiting (governor, keyed by client IP)
//! 3. `TraceLayer` (request span with `request_id` and `session` fields)
//! 4. Request ID (record on span, echo in response)
//! 5. Security headers
//! 6. Cookie manager (`tower-cookies`)
//! 7. Session identity (signed `w4w_session` cookie)
//!
//! Admin authentication is an extractor ([`RequireAdmin`]), applied per handler.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AdminAuthRejection, RequireAdmin};
pub use rate_limit::storefront_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{
    SESSION_COOKIE_NAME, SessionError, derive_cookie_key, generate_session_id,
    session_identity_middleware,
};
