//! Integration tests for Ward 4 Woods.
//!
//! The storefront router is driven in-process with `tower::ServiceExt::oneshot`
//! over an in-memory store, so no database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ward4woods-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart` - Session cookie and cart flows
//! - `catalog` - Public pages, probes and static files
//! - `admin` - Basic Auth and product management

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::SecretString;
use tower::ServiceExt;
use uuid::Uuid;

use ward4woods_core::{Price, ProductId};
use ward4woods_storefront::build_router;
use ward4woods_storefront::config::{AdminCredentials, AppEnv, StorefrontConfig};
use ward4woods_storefront::db::MemoryStore;
use ward4woods_storefront::middleware::SESSION_COOKIE_NAME;
use ward4woods_storefront::models::ProductInput;
use ward4woods_storefront::state::AppState;

pub const ADMIN_USER: &str = "workshop";
pub const ADMIN_PASS: &str = "sawdust-and-varnish";

/// Largest response body the helpers will buffer.
const MAX_BODY: usize = 1024 * 1024;

/// Configuration pointing at the repository's static and uploads directories.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        app_env: AppEnv::Development,
        session_key: SecretString::from("kX9#mQ2$vL7@nR4!pT8&wZ3*jF6^hB1%"),
        admin: AdminCredentials {
            username: ADMIN_USER.to_string(),
            password: SecretString::from(ADMIN_PASS),
        },
        static_dir: manifest.join("../storefront/static"),
        uploads_dir: manifest.join("../../uploads"),
        sentry_dsn: None,
        trust_proxy_headers: false,
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `name=value` pair of the session cookie set by this response, if any.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
            .map(str::to_string)
    }

    /// Value of a response header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Cart line ids linked from a cart page or fragment, in page order.
    #[must_use]
    pub fn cart_item_ids(&self) -> Vec<i32> {
        self.body
            .split("hx-delete=\"/cart/")
            .skip(1)
            .filter_map(|rest| {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().ok()
            })
            .collect()
    }
}

/// The storefront wired over a fresh in-memory store.
pub struct TestApp {
    router: Router,
    state: AppState,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config(), store.clone(), store);
        let router = build_router(state.clone());
        Self { router, state }
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Send a request through the full middleware stack.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read.
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), MAX_BODY)
            .await
            .expect("read response body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Send a bodyless request, optionally carrying a cookie.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn send(&self, method: Method, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::empty()).expect("build request"))
            .await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, cookie).await
    }

    /// Start a session and return its cookie.
    ///
    /// # Panics
    ///
    /// Panics if the storefront does not issue a session cookie.
    pub async fn start_session(&self) -> String {
        self.get("/health", None)
            .await
            .session_cookie()
            .expect("session cookie issued")
    }

    /// Send an admin request with the given Basic Auth credentials and an
    /// optional urlencoded form body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn admin_as(
        &self,
        credentials: Option<(&str, &str)>,
        method: Method,
        uri: &str,
        form: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((user, pass)) = credentials {
            let encoded = STANDARD.encode(format!("{user}:{pass}"));
            builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        self.request(builder.body(body).expect("build request")).await
    }

    /// Send an admin request with the configured credentials.
    pub async fn admin(&self, method: Method, uri: &str, form: Option<&str>) -> TestResponse {
        self.admin_as(Some((ADMIN_USER, ADMIN_PASS)), method, uri, form)
            .await
    }

    /// Insert a product directly through the catalog service.
    ///
    /// # Panics
    ///
    /// Panics if the product is invalid or cannot be stored.
    pub async fn seed_product(&self, name: &str, cents: i64, category: &str) -> ProductId {
        let input = ProductInput::new(name, Price::from_cents(cents), "", category)
            .expect("valid product");
        self.state
            .catalog()
            .create_product(&input)
            .await
            .expect("create product")
    }

    /// Record an image for a product and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub async fn seed_image(&self, product_id: ProductId, is_main: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .catalog()
            .add_image(product_id, id, is_main)
            .await
            .expect("add image");
        id
    }
}
