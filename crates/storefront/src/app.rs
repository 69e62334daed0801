//! Router assembly.
//!
//! [`build_router`] wires routes, static file serving and the per-request
//! middleware. Process-level layers (Sentry, rate limiting) are added by the
//! binary so tests can drive the router directly with `oneshot`.

use axum::{Router, extract::Request, middleware};
use tower_cookies::CookieManagerLayer;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::field::Empty;

use crate::middleware::{
    request_id_middleware, security_headers_middleware, session_identity_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Build the storefront router over the given state.
pub fn build_router(state: AppState) -> Router {
    let config = state.config();
    let static_files = ServeDir::new(&config.static_dir);
    let images = ServeDir::new(&config.uploads_dir);

    routes::routes()
        .nest_service("/static", static_files)
        .nest_service("/images", images)
        // Innermost first: session identity needs the cookie manager
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_identity_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = Empty,
                session = Empty,
            )
        }))
        .with_state(state)
}
