//! Product repository for database operations.
//!
//! Queries are checked at runtime (`query_as` with `FromRow` row types) so the
//! crate builds without a live database.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use ward4woods_core::{Price, ProductId};

use super::{ProductStore, RepositoryError};
use crate::models::{Product, ProductImage, ProductInput};

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_id: ProductId,
    name: String,
    price: i64,
    description: String,
    category: String,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, RepositoryError> {
        if self.price < 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price {} for product {}",
                self.price, self.product_id
            )));
        }
        Ok(Product {
            id: self.product_id,
            name: self.name,
            price: Price::from_cents(self.price),
            description: self.description,
            category: self.category,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    product: ProductRow,
    main_image: Option<Uuid>,
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    product_id: ProductId,
    is_main: bool,
}

impl From<ImageRow> for ProductImage {
    fn from(row: ImageRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            is_main: row.is_main,
        }
    }
}

/// Repository for catalog database operations.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<(Product, Option<Uuid>)>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r"
            SELECT p.product_id, p.name, p.price, p.description, p.category,
                   i.id AS main_image
            FROM products p
            LEFT JOIN product_images i ON i.product_id = p.product_id AND i.is_main
            ORDER BY p.product_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Ok((row.product.into_product()?, row.main_image)))
            .collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            SELECT product_id, name, price, description, category
            FROM products
            WHERE product_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(ProductRow::into_product)
        .transpose()
    }

    async fn create_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO products (name, price, description, category)
            VALUES ($1, $2, $3, $4)
            RETURNING product_id
            ",
        )
        .bind(&input.name)
        .bind(input.price.cents())
        .bind(&input.description)
        .bind(&input.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = $1, price = $2, description = $3, category = $4
            WHERE product_id = $5
            ",
        )
        .bind(&input.name)
        .bind(input.price.cents())
        .bind(&input.description)
        .bind(&input.category)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_product(&self, id: ProductId) -> Result<u64, RepositoryError> {
        // Images and cart lines go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn add_image(&self, image: ProductImage) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if image.is_main {
            sqlx::query(
                "UPDATE product_images SET is_main = FALSE WHERE product_id = $1 AND is_main",
            )
            .bind(image.product_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO product_images (id, product_id, is_main) VALUES ($1, $2, $3)")
            .bind(image.id)
            .bind(image.product_id)
            .bind(image.is_main)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "image already recorded"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn images(&self, product_id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ImageRow>(
            r"
            SELECT id, product_id, is_main
            FROM product_images
            WHERE product_id = $1
            ORDER BY is_main DESC, created_at, id
            ",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductImage::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CartRepository, contract};

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_product_crud(pool: PgPool) {
        let products = ProductRepository::new(pool.clone());
        let carts = CartRepository::new(pool);
        contract::product_crud(&products, &carts).await;
    }
}
