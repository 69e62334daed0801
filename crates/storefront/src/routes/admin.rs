//! Admin route handlers.
//!
//! Product management behind HTTP Basic Auth ([`RequireAdmin`]). Forms post
//! plain values; validation errors come back as 400 with the reason.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use ward4woods_core::ProductId;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Category, Product, ProductInput};
use crate::state::AppState;

/// Where the product table lives; creation redirects here.
const PRODUCTS_PATH: &str = "/admin/viewproducts";

/// Product create/update form data.
///
/// Absent fields read as empty so validation reports them as a bad request.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

impl ProductForm {
    fn validate(&self) -> std::result::Result<ProductInput, crate::models::InvalidProduct> {
        ProductInput::parse(&self.name, &self.price, &self.description, &self.category)
    }
}

/// Product row/form display data for admin templates.
#[derive(Clone)]
pub struct AdminProductView {
    pub id: i32,
    pub name: String,
    /// Display form, e.g. `$12.50`.
    pub price: String,
    /// Form input value, e.g. `12.50`.
    pub price_input: String,
    pub description: String,
    pub category: String,
}

impl From<Product> for AdminProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.as_i32(),
            price: product.price.to_string(),
            price_input: product.price.to_decimal().to_string(),
            name: product.name,
            description: product.description,
            category: product.category,
        }
    }
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    pub username: String,
    pub product_count: usize,
    pub category_count: usize,
}

/// Admin product table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub products: Vec<AdminProductView>,
}

/// New product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/new_product.html")]
pub struct NewProductTemplate {
    pub categories: Vec<String>,
}

/// Edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/edit_product.html")]
pub struct EditProductTemplate {
    pub product: AdminProductView,
    pub categories: Vec<Category>,
}

/// Short status message fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub message: String,
}

/// Admin dashboard.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(username): RequireAdmin,
) -> Result<impl IntoResponse> {
    let product_count = state.catalog().list_products().await?.len();
    let category_count = state.catalog().categories().await?.len();

    Ok(AdminIndexTemplate {
        username,
        product_count,
        category_count,
    })
}

/// Product table.
#[instrument(skip_all)]
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let products = state
        .catalog()
        .list_products()
        .await?
        .into_iter()
        .map(|listing| AdminProductView::from(listing.product))
        .collect();

    Ok(AdminProductsTemplate { products })
}

/// New product form.
#[instrument(skip_all)]
pub async fn new_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let categories = state.catalog().categories().await?;
    Ok(NewProductTemplate { categories })
}

/// Edit product form.
#[instrument(skip(state, _admin))]
pub async fn edit_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().product(id).await?;
    let categories = state.catalog().categories_for(id).await?;

    Ok(EditProductTemplate {
        product: AdminProductView::from(product),
        categories,
    })
}

/// Create product, then show the product table.
#[instrument(skip(state, _admin))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<ProductForm>,
) -> Result<impl IntoResponse> {
    let input = form.validate()?;
    state.catalog().create_product(&input).await?;
    Ok(Redirect::to(PRODUCTS_PATH))
}

/// Update product (HTMX `PUT`).
#[instrument(skip(state, _admin))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<impl IntoResponse> {
    let input = form.validate()?;
    state.catalog().update_product(id, &input).await?;

    Ok(NoticeTemplate {
        message: format!("Saved {}", input.name),
    })
}

/// Delete product (HTMX `DELETE`).
///
/// Returns an empty 200 so HTMX swaps the table row out.
#[instrument(skip(state, _admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    state.catalog().delete_product(id).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ward4woods_core::Price;

    use super::*;

    #[test]
    fn test_form_validation() {
        let form = ProductForm {
            name: "Cutting Board".to_string(),
            price: "39.5".to_string(),
            description: String::new(),
            category: "Kitchen".to_string(),
        };
        assert_eq!(form.validate().unwrap().price, Price::from_cents(3950));

        let form = ProductForm {
            category: "  ".to_string(),
            ..form
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_view_formats_price_for_display_and_input() {
        let view = AdminProductView::from(Product {
            id: ProductId::new(3),
            name: "Stool".to_string(),
            price: Price::from_cents(1250),
            description: String::new(),
            category: "Furniture".to_string(),
        });
        assert_eq!(view.price, "$12.50");
        assert_eq!(view.price_input, "12.50");
    }
}
