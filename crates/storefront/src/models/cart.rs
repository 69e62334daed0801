//! Cart domain types.

use chrono::{DateTime, Utc};

use ward4woods_core::{CartItemId, Price};

use super::Product;

/// One line of a cart: a product reference with its own line item ID.
///
/// The line item ID, not the product ID, is what the shopper sends back to
/// remove the line, so ownership can be checked against the session's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// ID of this line item.
    pub cart_item_id: CartItemId,
    /// The referenced product, as currently stored in the catalog.
    pub product: Product,
    /// When the product was added to the cart.
    pub added_at: DateTime<Utc>,
}

/// Total price of a set of cart lines.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Price {
    lines.iter().map(|line| line.product.price).sum()
}
