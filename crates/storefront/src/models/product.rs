//! Catalog domain types.

use thiserror::Error;
use uuid::Uuid;

use ward4woods_core::{Price, PriceError, ProductId};

/// Image file shown for products that have no main image.
pub const PLACEHOLDER_IMAGE: &str = "no-image.png";

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
}

/// Validated fields for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
}

/// Reasons a product submission is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProduct {
    #[error("name is required")]
    EmptyName,
    #[error("category is required")]
    EmptyCategory,
    #[error(transparent)]
    Price(#[from] PriceError),
}

impl ProductInput {
    /// Validate raw form values.
    ///
    /// Name and category are trimmed and must not be empty. The description
    /// may be empty. The price is parsed as a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidProduct` reason found.
    pub fn parse(
        name: &str,
        price: &str,
        description: &str,
        category: &str,
    ) -> Result<Self, InvalidProduct> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InvalidProduct::EmptyName);
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(InvalidProduct::EmptyCategory);
        }
        let price = Price::parse(price)?;

        Ok(Self {
            name: name.to_owned(),
            price,
            description: description.trim().to_owned(),
            category: category.to_owned(),
        })
    }

    /// Validate already-typed values (used by seeding).
    ///
    /// # Errors
    ///
    /// Returns `InvalidProduct` if name or category is empty.
    pub fn new(
        name: &str,
        price: Price,
        description: &str,
        category: &str,
    ) -> Result<Self, InvalidProduct> {
        let mut input = Self::parse(name, "0", description, category)?;
        input.price = price;
        Ok(input)
    }
}

/// A stored image record for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: ProductId,
    pub is_main: bool,
}

/// A product as shown in listings: with its main image file name.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub product: Product,
    pub main_image: String,
}

/// A product as shown on its detail page.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub product: Product,
    pub main_image: String,
    pub other_images: Vec<String>,
}

/// A category option, marking the one belonging to the product being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub selected: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_converts_price() {
        let input = ProductInput::parse("  Walnut Bowl ", "45.50", " turned ", " Bowls ").unwrap();
        assert_eq!(input.name, "Walnut Bowl");
        assert_eq!(input.price.cents(), 4550);
        assert_eq!(input.description, "turned");
        assert_eq!(input.category, "Bowls");
    }

    #[test]
    fn test_parse_allows_empty_description() {
        assert!(ProductInput::parse("Spoon", "5", "", "Utensils").is_ok());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert_eq!(
            ProductInput::parse(" ", "5", "", "Utensils"),
            Err(InvalidProduct::EmptyName)
        );
        assert_eq!(
            ProductInput::parse("Spoon", "5", "", ""),
            Err(InvalidProduct::EmptyCategory)
        );
        assert_eq!(
            ProductInput::parse("Spoon", "", "", "Utensils"),
            Err(InvalidProduct::Price(PriceError::Empty))
        );
    }

    #[test]
    fn test_new_keeps_typed_price() {
        let input = ProductInput::new("Board", Price::from_cents(2999), "", "Boards").unwrap();
        assert_eq!(input.price, Price::from_cents(2999));
    }
}
