//! Session cart service.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use ward4woods_core::{CartItemId, ProductId};

use super::ServiceError;
use crate::db::{CartStore, RepositoryError};
use crate::models::{CartLine, SessionId};

/// Cart operations for one visitor session at a time.
///
/// Carts are created lazily: the first add, view or clear for a session is
/// what brings its cart into existence.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
}

impl CartService {
    /// Create a new cart service.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    /// Add a product to the session's cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::DuplicateItem` if the product is already in the cart.
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self, session), fields(session = session.short()))]
    pub async fn add_to_cart(
        &self,
        session: &SessionId,
        product_id: ProductId,
    ) -> Result<CartItemId, ServiceError> {
        self.store.ensure_cart(session).await?;

        let lines = self.store.list_items(session).await?;
        if lines.iter().any(|line| line.product.id == product_id) {
            return Err(ServiceError::DuplicateItem(product_id));
        }

        // A concurrent add can slip past the check above; the store's unique
        // constraint turns the loser into a Conflict.
        match self.store.add_item(session, product_id).await {
            Ok(cart_item_id) => {
                info!(%cart_item_id, "Product added to cart");
                Ok(cart_item_id)
            }
            Err(RepositoryError::Conflict(_)) => Err(ServiceError::DuplicateItem(product_id)),
            Err(RepositoryError::NotFound) => {
                Err(ServiceError::NotFound(format!("product {product_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a line item from the session's cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the line item does not exist.
    /// Returns `ServiceError::Unauthorized` if it belongs to another session.
    #[instrument(skip(self, session), fields(session = session.short()))]
    pub async fn remove_from_cart(
        &self,
        session: &SessionId,
        cart_item_id: CartItemId,
    ) -> Result<(), ServiceError> {
        let not_found = || ServiceError::NotFound(format!("cart item {cart_item_id}"));

        let owner = self.store.item_owner(cart_item_id).await?.ok_or_else(not_found)?;
        if owner != *session {
            warn!(owner = owner.short(), "Attempt to remove another session's cart item");
            return Err(ServiceError::Unauthorized);
        }

        // Zero rows here means the line vanished between the lookup and the delete.
        if self.store.remove_item(session, cart_item_id).await? == 0 {
            return Err(not_found());
        }

        info!("Cart item removed");
        Ok(())
    }

    /// Lines in the session's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self, session), fields(session = session.short()))]
    pub async fn cart_contents(&self, session: &SessionId) -> Result<Vec<CartLine>, ServiceError> {
        Ok(self.store.list_items(session).await?)
    }

    /// Remove every line from the session's cart, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self, session), fields(session = session.short()))]
    pub async fn clear_cart(&self, session: &SessionId) -> Result<u64, ServiceError> {
        self.store.ensure_cart(session).await?;
        let removed = self.store.clear(session).await?;
        info!(removed, "Cart cleared");
        Ok(removed)
    }

    /// Number of lines in the session's cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    pub async fn item_count(&self, session: &SessionId) -> Result<usize, ServiceError> {
        Ok(self.store.list_items(session).await?.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use ward4woods_core::CartId;

    use super::*;
    use crate::db::contract::input;
    use crate::db::{MemoryStore, ProductStore};

    fn setup() -> (Arc<MemoryStore>, CartService) {
        let store = Arc::new(MemoryStore::new());
        let service = CartService::new(store.clone());
        (store, service)
    }

    async fn product(store: &MemoryStore, name: &str) -> ProductId {
        store.create_product(&input(name, 1_000, "Test")).await.unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected() {
        let (store, carts) = setup();
        let session = SessionId::new("dup-session");
        let chair = product(&store, "Chair").await;

        carts.add_to_cart(&session, chair).await.unwrap();
        let second = carts.add_to_cart(&session, chair).await;

        assert!(matches!(second, Err(ServiceError::DuplicateItem(id)) if id == chair));
        assert_eq!(carts.cart_contents(&session).await.unwrap().len(), 1);
    }

    /// Cart store whose listing never shows existing lines, as seen by a
    /// request that read the cart before a concurrent add committed.
    struct StaleListing(MemoryStore);

    #[async_trait::async_trait]
    impl CartStore for StaleListing {
        async fn ensure_cart(&self, session: &SessionId) -> Result<CartId, RepositoryError> {
            self.0.ensure_cart(session).await
        }
        async fn add_item(
            &self,
            session: &SessionId,
            product_id: ProductId,
        ) -> Result<CartItemId, RepositoryError> {
            self.0.add_item(session, product_id).await
        }
        async fn item_owner(
            &self,
            cart_item_id: CartItemId,
        ) -> Result<Option<SessionId>, RepositoryError> {
            self.0.item_owner(cart_item_id).await
        }
        async fn remove_item(
            &self,
            session: &SessionId,
            cart_item_id: CartItemId,
        ) -> Result<u64, RepositoryError> {
            self.0.remove_item(session, cart_item_id).await
        }
        async fn list_items(&self, _session: &SessionId) -> Result<Vec<CartLine>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn clear(&self, session: &SessionId) -> Result<u64, RepositoryError> {
            self.0.clear(session).await
        }
    }

    #[tokio::test]
    async fn test_store_conflict_is_reported_as_duplicate() {
        let store = Arc::new(StaleListing(MemoryStore::new()));
        let carts = CartService::new(store.clone());
        let session = SessionId::new("stale-session");
        let chair = product(&store.0, "Chair").await;

        carts.add_to_cart(&session, chair).await.unwrap();
        let second = carts.add_to_cart(&session, chair).await;

        assert!(matches!(second, Err(ServiceError::DuplicateItem(id)) if id == chair));
        assert_eq!(store.0.list_items(&session).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_keep_one_line() {
        let (store, carts) = setup();
        let session = SessionId::new("racing-session");
        let chair = product(&store, "Chair").await;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let carts = carts.clone();
                let session = session.clone();
                tokio::spawn(async move { carts.add_to_cart(&session, chair).await })
            })
            .collect();

        let mut added = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => added += 1,
                Err(ServiceError::DuplicateItem(id)) => assert_eq!(id, chair),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(added, 1);
        assert_eq!(carts.cart_contents(&session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let (_store, carts) = setup();
        let session = SessionId::new("ghost-session");

        let result = carts.add_to_cart(&session, ProductId::new(404)).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert!(carts.cart_contents(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_other_sessions_item_is_unauthorized() {
        let (store, carts) = setup();
        let alice = SessionId::new("alice-session");
        let mallory = SessionId::new("mallory-session");
        let bowl = product(&store, "Bowl").await;
        let spoon = product(&store, "Spoon").await;

        let alice_line = carts.add_to_cart(&alice, bowl).await.unwrap();
        carts.add_to_cart(&mallory, spoon).await.unwrap();

        let result = carts.remove_from_cart(&mallory, alice_line).await;

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
        assert_eq!(carts.cart_contents(&alice).await.unwrap().len(), 1);
        assert_eq!(carts.cart_contents(&mallory).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_missing_item_is_not_found() {
        let (_store, carts) = setup();
        let session = SessionId::new("empty-session");

        let result = carts.remove_from_cart(&session, CartItemId::new(12)).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_keeps_cart_usable() {
        let (store, carts) = setup();
        let session = SessionId::new("clear-session");
        let ids = [
            product(&store, "A").await,
            product(&store, "B").await,
            product(&store, "C").await,
        ];
        for id in ids {
            carts.add_to_cart(&session, id).await.unwrap();
        }

        assert_eq!(carts.clear_cart(&session).await.unwrap(), 3);
        assert!(carts.cart_contents(&session).await.unwrap().is_empty());

        carts.add_to_cart(&session, ids[0]).await.unwrap();
        assert_eq!(carts.item_count(&session).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_fresh_session_removes_nothing() {
        let (_store, carts) = setup();
        assert_eq!(carts.clear_cart(&SessionId::new("fresh")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fresh_session_has_empty_cart() {
        let (_store, carts) = setup();
        let session = SessionId::new("never-seen");

        assert!(carts.cart_contents(&session).await.unwrap().is_empty());
        assert_eq!(carts.item_count(&session).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_add_remove_leaves_second_product() {
        let (store, carts) = setup();
        let session = SessionId::new("scenario-session");
        let first = product(&store, "First").await;
        let second = product(&store, "Second").await;

        let first_line = carts.add_to_cart(&session, first).await.unwrap();
        carts.add_to_cart(&session, second).await.unwrap();
        carts.remove_from_cart(&session, first_line).await.unwrap();

        let lines = carts.cart_contents(&session).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product.id, second);
    }

    #[tokio::test]
    async fn test_deleted_product_disappears_from_cart() {
        let (store, carts) = setup();
        let session = SessionId::new("cascade-session");
        let stool = product(&store, "Stool").await;
        carts.add_to_cart(&session, stool).await.unwrap();

        store.delete_product(stool).await.unwrap();

        assert!(carts.cart_contents(&session).await.unwrap().is_empty());
    }
}
