//! Database operations for the storefront.
//!
//! # Database: `PostgreSQL`
//!
//! ## Tables
//!
//! - `products` - Catalog (price stored as integer cents)
//! - `product_images` - Image records; files live in the uploads directory
//! - `carts` - One cart per session identifier
//! - `cart_items` - Line items, unique per `(cart_id, product_id)`
//!
//! # Stores
//!
//! Storage is accessed through the [`ProductStore`] and [`CartStore`] traits so
//! services stay independent of the backing database:
//!
//! - [`ProductRepository`] / [`CartRepository`] - `PostgreSQL`
//! - [`MemoryStore`] - in-process tables with the same contract
//!
//! Stores return raw [`RepositoryError`]s; business meaning is assigned by
//! [`crate::services`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p ward4woods-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod products;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

use ward4woods_core::{CartId, CartItemId, ProductId};

use crate::models::{CartLine, Product, ProductImage, ProductInput, SessionId};

pub use carts::CartRepository;
pub use memory::MemoryStore;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A referenced entity does not exist.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., product already in cart).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Another main image for the same product was committed first.
    #[error("product already has a main image")]
    MainImageTaken,
}

/// Partial unique index allowing one main image per product.
pub(crate) const MAIN_IMAGE_INDEX: &str = "product_images_one_main_idx";

impl RepositoryError {
    /// Classify a sqlx error, mapping unique and foreign key violations.
    pub(crate) fn from_constraint(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                if db_err.constraint() == Some(MAIN_IMAGE_INDEX) {
                    return Self::MainImageTaken;
                }
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::NotFound;
            }
        }
        Self::Database(e)
    }
}

/// Catalog storage.
///
/// Mutations report the number of affected rows; deciding what a zero count
/// means is left to the caller.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// All products ordered by ID, each with its main image if it has one.
    async fn list_products(&self) -> Result<Vec<(Product, Option<Uuid>)>, RepositoryError>;

    /// A single product.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product, returning its new ID.
    async fn create_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError>;

    /// Overwrite a product's fields.
    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<u64, RepositoryError>;

    /// Delete a product along with its images and any cart lines referencing it.
    async fn delete_product(&self, id: ProductId) -> Result<u64, RepositoryError>;

    /// Distinct product categories, sorted.
    async fn categories(&self) -> Result<Vec<String>, RepositoryError>;

    /// Record an image for a product.
    ///
    /// A new main image demotes the product's previous main image.
    /// Fails with `NotFound` if the product does not exist.
    async fn add_image(&self, image: ProductImage) -> Result<(), RepositoryError>;

    /// A product's images, main image first, then in insertion order.
    async fn images(&self, product_id: ProductId) -> Result<Vec<ProductImage>, RepositoryError>;
}

/// Session cart storage.
///
/// Carts are addressed by session identifier. Implementations must keep the
/// `(cart, product)` pair unique even under concurrent adds.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Create the session's cart if it does not exist yet. Idempotent.
    async fn ensure_cart(&self, session: &SessionId) -> Result<CartId, RepositoryError>;

    /// Insert a line item for `product_id` into the session's cart.
    ///
    /// Fails with `Conflict` if the product is already in the cart and with
    /// `NotFound` if the product or the cart does not exist.
    async fn add_item(
        &self,
        session: &SessionId,
        product_id: ProductId,
    ) -> Result<CartItemId, RepositoryError>;

    /// The session owning a line item, if the line item exists.
    async fn item_owner(
        &self,
        cart_item_id: CartItemId,
    ) -> Result<Option<SessionId>, RepositoryError>;

    /// Delete a line item, but only from the session's own cart.
    async fn remove_item(
        &self,
        session: &SessionId,
        cart_item_id: CartItemId,
    ) -> Result<u64, RepositoryError>;

    /// Line items joined with product details, in insertion order.
    ///
    /// Empty when the session has no cart yet.
    async fn list_items(&self, session: &SessionId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Delete every line item in the session's cart. The cart itself remains.
    async fn clear(&self, session: &SessionId) -> Result<u64, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
