//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_cookies::Key;

use crate::config::StorefrontConfig;
use crate::db::{CartRepository, CartStore, ProductRepository, ProductStore};
use crate::middleware::derive_cookie_key;
use crate::services::{CartService, ProductService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the catalog and cart services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: ProductService,
    carts: CartService,
    cookie_key: Key,
}

impl AppState {
    /// Create application state over arbitrary stores.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `products` - Catalog store
    /// * `carts` - Cart store
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        products: Arc<dyn ProductStore>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        let cookie_key = derive_cookie_key(config.session_key.expose_secret().as_bytes());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: ProductService::new(products),
                carts: CartService::new(carts),
                cookie_key,
            }),
        }
    }

    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn with_postgres(config: StorefrontConfig, pool: PgPool) -> Self {
        let products = Arc::new(ProductRepository::new(pool.clone()));
        let carts = Arc::new(CartRepository::new(pool));
        Self::new(config, products, carts)
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog service.
    #[must_use]
    pub fn catalog(&self) -> &ProductService {
        &self.inner.catalog
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Key signing the session cookie.
    #[must_use]
    pub fn cookie_key(&self) -> &Key {
        &self.inner.cookie_key
    }
}
