//! In-process store implementing both [`ProductStore`] and [`CartStore`].
//!
//! Backs the unit and HTTP integration tests, which run without `PostgreSQL`.
//! All tables live behind one async mutex, which
//! gives every operation the same atomicity a single SQL statement would have:
//! the duplicate check in `add_item` and the insert happen under the same lock.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use ward4woods_core::{CartId, CartItemId, ProductId};

use super::{CartStore, ProductStore, RepositoryError};
use crate::models::{CartLine, Product, ProductImage, ProductInput, SessionId};

struct ItemRow {
    cart_id: CartId,
    product_id: ProductId,
    added_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    /// Insertion order is preserved; it is the secondary image ordering.
    images: Vec<ProductImage>,
    carts: HashMap<SessionId, CartId>,
    items: BTreeMap<CartItemId, ItemRow>,
    last_product_id: i32,
    last_cart_id: i32,
    last_item_id: i32,
}

impl Tables {
    fn cart_of(&self, session: &SessionId) -> Option<CartId> {
        self.carts.get(session).copied()
    }
}

/// Next value of a `SERIAL`-like counter.
fn next_id(counter: &mut i32) -> Result<i32, RepositoryError> {
    *counter = counter
        .checked_add(1)
        .ok_or_else(|| RepositoryError::DataCorruption("id sequence exhausted".to_owned()))?;
    Ok(*counter)
}

/// Catalog and cart tables held in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<(Product, Option<Uuid>)>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .values()
            .map(|product| {
                let main = tables
                    .images
                    .iter()
                    .find(|img| img.product_id == product.id && img.is_main)
                    .map(|img| img.id);
                (product.clone(), main)
            })
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn create_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let id = ProductId::new(next_id(&mut tables.last_product_id)?);
        tables.products.insert(
            id,
            Product {
                id,
                name: input.name.clone(),
                price: input.price,
                description: input.description.clone(),
                category: input.category.clone(),
            },
        );
        Ok(id)
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(0);
        };
        product.name.clone_from(&input.name);
        product.price = input.price;
        product.description.clone_from(&input.description);
        product.category.clone_from(&input.category);
        Ok(1)
    }

    async fn delete_product(&self, id: ProductId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.products.remove(&id).is_none() {
            return Ok(0);
        }
        tables.images.retain(|img| img.product_id != id);
        tables.items.retain(|_, item| item.product_id != id);
        Ok(1)
    }

    async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut categories: Vec<String> =
            tables.products.values().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn add_image(&self, image: ProductImage) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&image.product_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.images.iter().any(|img| img.id == image.id) {
            return Err(RepositoryError::Conflict("image already recorded".to_owned()));
        }
        if image.is_main {
            for img in tables
                .images
                .iter_mut()
                .filter(|img| img.product_id == image.product_id)
            {
                img.is_main = false;
            }
        }
        tables.images.push(image);
        Ok(())
    }

    async fn images(&self, product_id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut images: Vec<ProductImage> = tables
            .images
            .iter()
            .filter(|img| img.product_id == product_id)
            .copied()
            .collect();
        // Stable sort keeps insertion order among equals.
        images.sort_by_key(|img| !img.is_main);
        Ok(images)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn ensure_cart(&self, session: &SessionId) -> Result<CartId, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(id) = tables.cart_of(session) {
            return Ok(id);
        }
        let id = CartId::new(next_id(&mut tables.last_cart_id)?);
        tables.carts.insert(session.clone(), id);
        Ok(id)
    }

    async fn add_item(
        &self,
        session: &SessionId,
        product_id: ProductId,
    ) -> Result<CartItemId, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let cart_id = tables.cart_of(session).ok_or(RepositoryError::NotFound)?;
        if !tables.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables
            .items
            .values()
            .any(|item| item.cart_id == cart_id && item.product_id == product_id)
        {
            return Err(RepositoryError::Conflict("product already in cart".to_owned()));
        }

        let id = CartItemId::new(next_id(&mut tables.last_item_id)?);
        tables.items.insert(
            id,
            ItemRow {
                cart_id,
                product_id,
                added_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn item_owner(
        &self,
        cart_item_id: CartItemId,
    ) -> Result<Option<SessionId>, RepositoryError> {
        let tables = self.tables.lock().await;
        let Some(item) = tables.items.get(&cart_item_id) else {
            return Ok(None);
        };
        let owner = tables
            .carts
            .iter()
            .find(|(_, id)| **id == item.cart_id)
            .map(|(session, _)| session.clone())
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "cart item {cart_item_id} references missing cart {}",
                    item.cart_id
                ))
            })?;
        Ok(Some(owner))
    }

    async fn remove_item(
        &self,
        session: &SessionId,
        cart_item_id: CartItemId,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(cart_id) = tables.cart_of(session) else {
            return Ok(0);
        };
        let owned = tables
            .items
            .get(&cart_item_id)
            .is_some_and(|item| item.cart_id == cart_id);
        if !owned {
            return Ok(0);
        }
        tables.items.remove(&cart_item_id);
        Ok(1)
    }

    async fn list_items(&self, session: &SessionId) -> Result<Vec<CartLine>, RepositoryError> {
        let tables = self.tables.lock().await;
        let Some(cart_id) = tables.cart_of(session) else {
            return Ok(Vec::new());
        };
        tables
            .items
            .iter()
            .filter(|(_, item)| item.cart_id == cart_id)
            .map(|(id, item)| {
                let product = tables.products.get(&item.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart item {id} references missing product {}",
                        item.product_id
                    ))
                })?;
                Ok(CartLine {
                    cart_item_id: *id,
                    product: product.clone(),
                    added_at: item.added_at,
                })
            })
            .collect()
    }

    async fn clear(&self, session: &SessionId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(cart_id) = tables.cart_of(session) else {
            return Ok(0);
        };
        let before = tables.items.len();
        tables.items.retain(|_, item| item.cart_id != cart_id);
        Ok((before - tables.items.len()) as u64)
    }
}
