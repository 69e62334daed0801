//! Seed the catalog from a YAML file.
//!
//! The whole file is parsed and validated before connecting to the
//! database, and its image ids are checked against the images already
//! recorded before anything is written. Products are then inserted one at a
//! time without a surrounding transaction: if the database fails partway,
//! the products inserted so far stay and the error says how many.
//!
//! # File Format
//!
//! ```yaml
//! products:
//!   - name: Walnut Cutting Board
//!     price: "45.00"
//!     category: Kitchen
//!     description: End grain, finished with mineral oil.
//!     images:
//!       - id: 6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10
//!         main: true
//!       - id: 0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44
//! ```
//!
//! Image ids name files in the uploads directory. When no image is marked
//! `main`, the first one is.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use ward4woods_storefront::db::{self, ProductRepository};
use ward4woods_storefront::models::ProductInput;
use ward4woods_storefront::services::{ProductService, ServiceError};

use super::migrate::database_url;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    products: Vec<SeedProductEntry>,
}

/// A product as written in the seed file.
#[derive(Debug, Deserialize)]
struct SeedProductEntry {
    name: String,
    price: PriceField,
    #[serde(default)]
    description: String,
    category: String,
    #[serde(default)]
    images: Vec<SeedImageEntry>,
}

/// Prices may be written quoted (`"12.50"`) or bare (`12.5`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Text(String),
    Number(f64),
}

impl PriceField {
    fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedImageEntry {
    id: Uuid,
    #[serde(default)]
    main: bool,
}

/// A validated product ready to insert.
#[derive(Debug)]
pub struct SeedProduct {
    pub input: ProductInput,
    /// Image ids, main image first.
    pub images: Vec<Uuid>,
}

/// Errors from reading or validating a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{} validation errors found", .0.len())]
    Invalid(Vec<String>),

    #[error("Seeding stopped after {inserted} of {total} products: {source}")]
    Interrupted {
        inserted: usize,
        total: usize,
        source: ServiceError,
    },
}

/// Parse and validate seed file contents.
///
/// Every product is checked; all problems are reported together.
///
/// # Errors
///
/// Returns `SeedError::Yaml` for malformed YAML and `SeedError::Invalid`
/// listing every product that fails validation.
pub fn parse_seed(content: &str) -> Result<Vec<SeedProduct>, SeedError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    let mut problems = Vec::new();
    let mut seen_images = HashSet::new();
    let mut products = Vec::with_capacity(file.products.len());

    for (index, entry) in file.products.into_iter().enumerate() {
        let position = index + 1;
        let label = if entry.name.trim().is_empty() {
            format!("product #{position}")
        } else {
            format!("product #{position} ({})", entry.name.trim())
        };

        let mains = entry.images.iter().filter(|image| image.main).count();
        if mains > 1 {
            problems.push(format!("{label}: {mains} images marked main, at most one allowed"));
        }
        for image in &entry.images {
            if !seen_images.insert(image.id) {
                problems.push(format!("{label}: image {} listed more than once", image.id));
            }
        }

        match ProductInput::parse(
            &entry.name,
            &entry.price.as_text(),
            &entry.description,
            &entry.category,
        ) {
            Ok(input) => {
                let (main, others): (Vec<_>, Vec<_>) =
                    entry.images.into_iter().partition(|image| image.main);
                let images = main.into_iter().chain(others).map(|image| image.id).collect();
                products.push(SeedProduct { input, images });
            }
            Err(e) => problems.push(format!("{label}: {e}")),
        }
    }

    if problems.is_empty() {
        Ok(products)
    } else {
        Err(SeedError::Invalid(problems))
    }
}

/// Problems for seed images whose ids are already recorded in the catalog.
#[must_use]
pub fn recorded_images(products: &[SeedProduct], existing: &HashSet<Uuid>) -> Vec<String> {
    products
        .iter()
        .flat_map(|product| {
            product
                .images
                .iter()
                .filter(|id| existing.contains(*id))
                .map(move |id| format!("{}: image {id} is already recorded", product.input.name))
        })
        .collect()
}

/// Image ids from the seed file that already exist in `product_images`.
async fn existing_images(
    pool: &sqlx::PgPool,
    products: &[SeedProduct],
) -> Result<HashSet<Uuid>, sqlx::Error> {
    let ids: Vec<Uuid> = products
        .iter()
        .flat_map(|product| product.images.iter().copied())
        .collect();
    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM product_images WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Insert validated products and their images, main image first.
///
/// Returns the number of images recorded.
///
/// # Errors
///
/// Returns `SeedError::Interrupted` with the count of products fully
/// inserted before the failure.
pub async fn insert(
    catalog: &ProductService,
    products: &[SeedProduct],
) -> Result<usize, SeedError> {
    let interrupted = |inserted, source| SeedError::Interrupted {
        inserted,
        total: products.len(),
        source,
    };

    let mut image_count = 0_usize;
    for (inserted, product) in products.iter().enumerate() {
        let id = catalog
            .create_product(&product.input)
            .await
            .map_err(|e| interrupted(inserted, e))?;
        for (position, image_id) in product.images.iter().enumerate() {
            catalog
                .add_image(id, *image_id, position == 0)
                .await
                .map_err(|e| interrupted(inserted, e))?;
            image_count += 1;
        }
    }
    Ok(image_count)
}

fn report(problems: Vec<String>) -> SeedError {
    error!("Seed file validation failed:");
    for problem in &problems {
        error!("  - {problem}");
    }
    SeedError::Invalid(problems)
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation,
/// `DATABASE_URL` is missing, or a database operation fails.
pub async fn products(file_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %file_path.display(), "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(SeedError::from)?;
    let products = match parse_seed(&content) {
        Ok(products) => products,
        Err(SeedError::Invalid(problems)) => return Err(report(problems).into()),
        Err(e) => return Err(e.into()),
    };
    info!(products = products.len(), "Seed file validated");

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let reused = recorded_images(&products, &existing_images(&pool, &products).await?);
    if !reused.is_empty() {
        return Err(report(reused).into());
    }

    let catalog = ProductService::new(Arc::new(ProductRepository::new(pool)));
    let image_count = insert(&catalog, &products).await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", products.len());
    info!("  Images recorded: {image_count}");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use ward4woods_core::Price;
    use ward4woods_storefront::db::MemoryStore;

    use super::*;

    const SHELF_YAML: &str = r"
products:
  - name: Shelf
    price: '80'
    category: Furniture
    images:
      - id: 6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10
  - name: Bench
    price: '90'
    category: Furniture
    images:
      - id: 0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44
";

    fn catalog() -> ProductService {
        ProductService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_parse_valid_file() {
        let yaml = r#"
products:
  - name: Walnut Cutting Board
    price: "45.00"
    category: Kitchen
    images:
      - id: 6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10
      - id: 0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44
        main: true
  - name: Oak Stool
    price: 120.5
    category: Furniture
"#;
        let products = parse_seed(yaml).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].input.price, Price::from_cents(4500));
        assert_eq!(products[0].input.description, "");
        assert_eq!(
            products[0].images[0].to_string(),
            "0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44"
        );
        assert_eq!(products[1].input.price, Price::from_cents(12050));
        assert!(products[1].images.is_empty());
    }

    #[test]
    fn test_first_image_is_main_when_none_marked() {
        let yaml = r"
products:
  - name: Board
    price: '10'
    category: Kitchen
    images:
      - id: 6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10
      - id: 0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44
";
        let products = parse_seed(yaml).unwrap();
        assert_eq!(
            products[0].images[0].to_string(),
            "6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10"
        );
    }

    #[test]
    fn test_reports_every_invalid_product() {
        let yaml = r#"
products:
  - name: ""
    price: "5"
    category: Kitchen
  - name: Fine
    price: "5"
    category: Kitchen
  - name: Pricey
    price: "-3"
    category: Kitchen
"#;
        let Err(SeedError::Invalid(problems)) = parse_seed(yaml) else {
            panic!("expected validation errors");
        };
        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("product #1:"));
        assert!(problems[1].starts_with("product #3 (Pricey):"));
    }

    #[test]
    fn test_rejects_two_main_images_and_reused_ids() {
        let yaml = r"
products:
  - name: Shelf
    price: '80'
    category: Furniture
    images:
      - id: 6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10
        main: true
      - id: 0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44
        main: true
  - name: Bench
    price: '90'
    category: Furniture
    images:
      - id: 6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10
";
        let Err(SeedError::Invalid(problems)) = parse_seed(yaml) else {
            panic!("expected validation errors");
        };
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("2 images marked main"));
        assert!(problems[1].contains("listed more than once"));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse_seed("products: [name: {"),
            Err(SeedError::Yaml(_))
        ));
    }

    #[test]
    fn test_recorded_images_are_reported_before_writing() {
        let products = parse_seed(SHELF_YAML).unwrap();
        let existing: HashSet<Uuid> = ["0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44".parse().unwrap()]
            .into_iter()
            .collect();

        let problems = recorded_images(&products, &existing);
        assert_eq!(
            problems,
            vec!["Bench: image 0b7d64c9-3f52-4a3c-8f0a-2d5f3a1e9b44 is already recorded"]
        );
        assert!(recorded_images(&products, &HashSet::new()).is_empty());
    }

    #[tokio::test]
    async fn test_insert_records_products_and_images() {
        let catalog = catalog();
        let products = parse_seed(SHELF_YAML).unwrap();

        let images = insert(&catalog, &products).await.unwrap();

        assert_eq!(images, 2);
        let listings = catalog.list_products().await.unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].main_image, "6f1c1a52-8c9e-4d8e-9a64-3c1b8e1f2a10");
    }

    #[tokio::test]
    async fn test_interrupted_insert_reports_progress() {
        let catalog = catalog();
        let products = parse_seed(SHELF_YAML).unwrap();
        // Bench's image already belongs to an earlier product
        let earlier = catalog.create_product(&products[0].input).await.unwrap();
        catalog.add_image(earlier, products[1].images[0], false).await.unwrap();

        let result = insert(&catalog, &products).await;

        let Err(SeedError::Interrupted { inserted, total, .. }) = result else {
            panic!("expected interrupted seeding, got {result:?}");
        };
        assert_eq!((inserted, total), (1, 2));
    }

    #[test]
    fn test_empty_file_seeds_nothing() {
        assert!(parse_seed("products: []").unwrap().is_empty());
    }
}
