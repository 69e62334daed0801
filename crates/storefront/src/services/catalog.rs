//! Catalog service: product CRUD and image records.
//!
//! Every mutating store call reports affected rows; zero rows always means
//! the product was not there and surfaces as `ServiceError::NotFound`.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use ward4woods_core::ProductId;

use super::ServiceError;
use crate::db::{ProductStore, RepositoryError};
use crate::models::{
    Category, PLACEHOLDER_IMAGE, Product, ProductDetails, ProductImage, ProductInput,
    ProductListing,
};

/// File name under which an image record's file is served.
fn image_file(id: Uuid) -> String {
    id.to_string()
}

fn product_not_found(id: ProductId) -> ServiceError {
    ServiceError::NotFound(format!("product {id}"))
}

/// Product catalog operations.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    /// Create a new product service.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Check that the catalog store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store cannot be reached.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }

    /// All products with their main image (or the placeholder).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductListing>, ServiceError> {
        let products = self.store.list_products().await?;
        Ok(products
            .into_iter()
            .map(|(product, main)| ProductListing {
                product,
                main_image: main.map_or_else(|| PLACEHOLDER_IMAGE.to_owned(), image_file),
            })
            .collect())
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// A product with its images split into the main image and the rest.
    ///
    /// Without a flagged main image the first image is shown instead; without
    /// any image the placeholder is.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn product_details(&self, id: ProductId) -> Result<ProductDetails, ServiceError> {
        let product = self.product(id).await?;
        let images = self.store.images(id).await?;

        let mut files = images.into_iter().map(|img| image_file(img.id));
        let main_image = files.next().unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned());

        Ok(ProductDetails {
            product,
            main_image,
            other_images: files.collect(),
        })
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<ProductId, ServiceError> {
        let id = self.store.create_product(input).await?;
        info!(product_id = %id, "Product created");
        Ok(id)
    }

    /// Overwrite a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), ServiceError> {
        if self.store.update_product(id, input).await? == 0 {
            return Err(product_not_found(id));
        }
        info!("Product updated");
        Ok(())
    }

    /// Delete a product, its images and every cart line referencing it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError> {
        if self.store.delete_product(id).await? == 0 {
            return Err(product_not_found(id));
        }
        info!("Product deleted");
        Ok(())
    }

    /// All categories, with the given product's own category marked selected.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn categories_for(&self, id: ProductId) -> Result<Vec<Category>, ServiceError> {
        let product = self.product(id).await?;
        let categories = self.store.categories().await?;
        Ok(categories
            .into_iter()
            .map(|name| Category {
                selected: name == product.category,
                name,
            })
            .collect())
    }

    /// Distinct categories, sorted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store fails.
    pub async fn categories(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.store.categories().await?)
    }

    /// Record an image for a product. A main image replaces the previous one.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    /// Returns `ServiceError::Validation` if the image id is already recorded,
    /// or if a concurrent upload recorded another main image first.
    #[instrument(skip(self))]
    pub async fn add_image(
        &self,
        product_id: ProductId,
        image_id: Uuid,
        is_main: bool,
    ) -> Result<(), ServiceError> {
        let image = ProductImage {
            id: image_id,
            product_id,
            is_main,
        };
        match self.store.add_image(image).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(product_not_found(product_id)),
            Err(RepositoryError::Conflict(_)) => Err(ServiceError::Validation(format!(
                "image {image_id} is already recorded"
            ))),
            Err(RepositoryError::MainImageTaken) => {
                warn!(%image_id, "Main image changed during upload");
                Err(ServiceError::Validation(format!(
                    "main image of product {product_id} changed during upload, try again"
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}
