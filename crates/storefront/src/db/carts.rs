//! Cart repository for database operations.
//!
//! Carts are keyed by session identifier. Every statement that touches a line
//! item joins through `carts.session_id`, so a session can never read or
//! modify another session's lines even if it guesses a line item ID.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ward4woods_core::{CartId, CartItemId, Price, ProductId};

use super::{CartStore, RepositoryError};
use crate::models::{CartLine, Product, SessionId};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    cart_item_id: CartItemId,
    added_at: DateTime<Utc>,
    product_id: ProductId,
    name: String,
    price: i64,
    description: String,
    category: String,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        if row.price < 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price {} for product {}",
                row.price, row.product_id
            )));
        }
        Ok(Self {
            cart_item_id: row.cart_item_id,
            added_at: row.added_at,
            product: Product {
                id: row.product_id,
                name: row.name,
                price: Price::from_cents(row.price),
                description: row.description,
                category: row.category,
            },
        })
    }
}

/// Repository for cart database operations.
#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for CartRepository {
    async fn ensure_cart(&self, session: &SessionId) -> Result<CartId, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO carts (session_id)
            VALUES ($1)
            ON CONFLICT (session_id) DO UPDATE SET session_id = EXCLUDED.session_id
            RETURNING cart_id
            ",
        )
        .bind(session.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn add_item(
        &self,
        session: &SessionId,
        product_id: ProductId,
    ) -> Result<CartItemId, RepositoryError> {
        // Zero rows from the SELECT means either the cart or the product is missing.
        let id = sqlx::query_scalar::<_, CartItemId>(
            r"
            INSERT INTO cart_items (cart_id, product_id)
            SELECT c.cart_id, p.product_id
            FROM carts c
            CROSS JOIN products p
            WHERE c.session_id = $1 AND p.product_id = $2
            RETURNING cart_item_id
            ",
        )
        .bind(session.as_str())
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product already in cart"))?;

        id.ok_or(RepositoryError::NotFound)
    }

    async fn item_owner(
        &self,
        cart_item_id: CartItemId,
    ) -> Result<Option<SessionId>, RepositoryError> {
        let owner = sqlx::query_scalar::<_, String>(
            r"
            SELECT c.session_id
            FROM cart_items ci
            JOIN carts c ON c.cart_id = ci.cart_id
            WHERE ci.cart_item_id = $1
            ",
        )
        .bind(cart_item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner.map(SessionId::new))
    }

    async fn remove_item(
        &self,
        session: &SessionId,
        cart_item_id: CartItemId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.cart_id
              AND c.session_id = $1
              AND ci.cart_item_id = $2
            ",
        )
        .bind(session.as_str())
        .bind(cart_item_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_items(&self, session: &SessionId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.cart_item_id, ci.added_at,
                   p.product_id, p.name, p.price, p.description, p.category
            FROM cart_items ci
            JOIN carts c ON c.cart_id = ci.cart_id
            JOIN products p ON p.product_id = ci.product_id
            WHERE c.session_id = $1
            ORDER BY ci.cart_item_id
            ",
        )
        .bind(session.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn clear(&self, session: &SessionId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.cart_id AND c.session_id = $1
            ",
        )
        .bind(session.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ProductRepository, contract};

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_cart_lifecycle(pool: PgPool) {
        let products = ProductRepository::new(pool.clone());
        let carts = CartRepository::new(pool);
        contract::cart_lifecycle(&products, &carts).await;
    }
}
