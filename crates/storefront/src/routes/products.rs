//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use ward4woods_core::ProductId;

use crate::error::Result;
use crate::filters;
use crate::models::{Category, ProductDetails, ProductListing};
use crate::state::AppState;

/// URL of an image file served from the uploads directory.
pub fn image_url(file: &str) -> String {
    format!("/images/{file}")
}

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub category: String,
    pub image_url: String,
}

impl From<ProductListing> for ProductCardView {
    fn from(listing: ProductListing) -> Self {
        Self {
            id: listing.product.id.as_i32(),
            price: listing.product.price.to_string(),
            image_url: image_url(&listing.main_image),
            name: listing.product.name,
            category: listing.product.category,
        }
    }
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub main_image_url: String,
    pub other_image_urls: Vec<String>,
}

impl From<ProductDetails> for ProductView {
    fn from(details: ProductDetails) -> Self {
        Self {
            id: details.product.id.as_i32(),
            price: details.product.price.to_string(),
            name: details.product.name,
            description: details.product.description,
            category: details.product.category,
            main_image_url: image_url(&details.main_image),
            other_image_urls: details.other_images.iter().map(|f| image_url(f)).collect(),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Category `<option>` list fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/category_options.html")]
pub struct CategoryOptionsTemplate {
    pub categories: Vec<Category>,
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = state
        .catalog()
        .list_products()
        .await?
        .into_iter()
        .map(ProductCardView::from)
        .collect();

    Ok(ProductsIndexTemplate { products })
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let details = state.catalog().product_details(id).await?;

    Ok(ProductShowTemplate {
        product: ProductView::from(details),
    })
}

/// Category options for a product, with its own category selected.
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let categories = state.catalog().categories_for(id).await?;
    Ok(CategoryOptionsTemplate { categories })
}
