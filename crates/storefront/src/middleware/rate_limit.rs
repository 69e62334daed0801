//! Per-client rate limiting using governor and `tower_governor`.
//!
//! Every client gets 5 requests per second replenished, with a burst of 10.
//!
//! Clients are keyed by TCP peer address unless proxy headers are trusted.
//! `X-Forwarded-For` and `X-Real-IP` are client-controlled when the server is
//! reached directly, so trust them only behind a reverse proxy that
//! overwrites both.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor keyed by client IP.
///
/// With `trust_proxy_headers` set, reads `X-Forwarded-For` (first hop), then
/// `X-Real-IP`, and falls back to the TCP peer address. Otherwise only the
/// peer address is used. The server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()` for the peer address.
#[derive(Clone, Copy, Default)]
pub struct ClientIpKeyExtractor {
    pub trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    fn proxied_ip(headers: &axum::http::HeaderMap) -> Option<IpAddr> {
        // First IP in the chain is the original client
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<IpAddr>().ok())
            })
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let proxied = self
            .trust_proxy_headers
            .then(|| Self::proxied_ip(req.headers()))
            .flatten();
        if let Some(ip) = proxied {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the storefront rate limiter: 5 requests per second per IP, burst of 10.
///
/// `trust_proxy_headers` must only be set behind a proxy that overwrites
/// `X-Forwarded-For` and `X-Real-IP`.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_millisecond(200)` and `burst_size(10)`), which are always
/// accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn storefront_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor {
            trust_proxy_headers,
        })
        .per_millisecond(200) // One token every 200ms = 5/second
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_millisecond(200) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}
