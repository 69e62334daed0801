//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (database ping)
//!
//! # Products
//! GET  /products                      - Product listing
//! GET  /products/{id}                 - Product detail
//! GET  /products/categories/{id}      - Category options fragment (HTMX)
//!
//! # Cart (HTMX fragments, scoped to the session cookie)
//! GET    /cart                        - Cart page
//! DELETE /cart                        - Empty cart (returns cart_items fragment)
//! GET    /cart/count                  - Cart count badge (fragment)
//! POST   /cart/{product_id}           - Add product (returns count badge)
//! DELETE /cart/{cart_item_id}         - Remove line (returns cart_items fragment)
//!
//! # Admin (HTTP Basic Auth)
//! GET    /admin                       - Dashboard
//! GET    /admin/viewproducts          - Product table
//! GET    /admin/newproduct            - New product form
//! GET    /admin/products/edit/{id}    - Edit product form
//! POST   /admin/products              - Create product (redirects to table)
//! PUT    /admin/products/{id}         - Update product (notice fragment)
//! DELETE /admin/products/{id}         - Delete product (empty 200)
//! ```
//!
//! `/static` and `/images` are served from disk, see [`crate::app`].

pub mod admin;
pub mod cart;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/categories/{id}", get(products::categories))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/{id}", post(cart::add).delete(cart::remove))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/viewproducts", get(admin::products))
        .route("/newproduct", get(admin::new_product))
        .route("/products", post(admin::create_product))
        .route("/products/edit/{id}", get(admin::edit_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Probes
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Admin routes
        .nest("/admin", admin_routes())
}
