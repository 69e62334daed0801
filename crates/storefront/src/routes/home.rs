//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::products::ProductCardView;
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: usize = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductCardView>,
}

/// Display the home page with the newest products.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let mut products = state.catalog().list_products().await?;
    products.reverse();
    let featured = products
        .into_iter()
        .take(FEATURED_COUNT)
        .map(ProductCardView::from)
        .collect();

    Ok(HomeTemplate { featured })
}
