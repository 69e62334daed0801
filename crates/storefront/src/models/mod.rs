//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`] and the template view types in [`crate::routes`].

pub mod cart;
pub mod product;
pub mod session;

pub use cart::CartLine;
pub use product::{
    Category, InvalidProduct, PLACEHOLDER_IMAGE, Product, ProductDetails, ProductImage,
    ProductInput, ProductListing,
};
pub use session::SessionId;
