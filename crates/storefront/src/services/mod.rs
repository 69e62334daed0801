//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`CartService`] - Session cart rules (no duplicates, ownership checks)
//! - [`ProductService`] - Catalog CRUD and image records
//!
//! Services own an `Arc<dyn Store>` and translate raw [`RepositoryError`]s into
//! [`ServiceError`], which handlers turn into HTTP responses.

mod cart;
mod catalog;

pub use cart::CartService;
pub use catalog::ProductService;

use thiserror::Error;

use ward4woods_core::ProductId;

use crate::db::RepositoryError;
use crate::models::InvalidProduct;

/// Errors returned by storefront services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The product is already in the cart.
    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),

    /// The line item belongs to another session's cart.
    #[error("cart item belongs to another session")]
    Unauthorized,

    /// Malformed or empty input.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl From<InvalidProduct> for ServiceError {
    fn from(e: InvalidProduct) -> Self {
        Self::Validation(e.to_string())
    }
}
