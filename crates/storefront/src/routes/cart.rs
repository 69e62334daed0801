//! Cart route handlers.
//!
//! Cart mutations use HTMX: they return a fragment and an `HX-Trigger:
//! cart-updated` header so the badge in the layout refreshes itself. The cart
//! belongs to whichever session the request carries.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{AppendHeaders, IntoResponse},
};
use tracing::instrument;

use ward4woods_core::{CartItemId, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::{CartLine, SessionId, cart::subtotal};
use crate::state::AppState;

/// HTMX event fired after every cart mutation.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub cart_item_id: i32,
    pub product_id: i32,
    pub name: String,
    pub category: String,
    pub price: String,
    pub added_at: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            cart_item_id: line.cart_item_id.as_i32(),
            product_id: line.product.id.as_i32(),
            name: line.product.name.clone(),
            category: line.product.category.clone(),
            price: line.product.price.to_string(),
            added_at: line.added_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: usize,
}

impl From<&[CartLine]> for CartView {
    fn from(lines: &[CartLine]) -> Self {
        Self {
            lines: lines.iter().map(CartLineView::from).collect(),
            subtotal: subtotal(lines).to_string(),
            item_count: lines.len(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

/// Fetch the session's cart as a view.
async fn cart_view(state: &AppState, session: &SessionId) -> Result<CartView> {
    let lines = state.carts().cart_contents(session).await?;
    Ok(CartView::from(lines.as_slice()))
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: SessionId) -> Result<impl IntoResponse> {
    Ok(CartShowTemplate {
        cart: cart_view(&state, &session).await?,
    })
}

/// Add a product to the cart (HTMX).
///
/// Returns the updated count badge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: SessionId,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    state.carts().add_to_cart(&session, product_id).await?;
    let product = product_id.to_string();
    add_breadcrumb("cart", "Added product", Some(&[("product_id", product.as_str())]));

    let count = state.carts().item_count(&session).await?;
    Ok((AppendHeaders([CART_UPDATED]), CartCountTemplate { count }))
}

/// Remove a line item from the cart (HTMX).
///
/// Returns the updated cart items fragment.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: SessionId,
    Path(cart_item_id): Path<CartItemId>,
) -> Result<impl IntoResponse> {
    state.carts().remove_from_cart(&session, cart_item_id).await?;
    let item = cart_item_id.to_string();
    add_breadcrumb("cart", "Removed line item", Some(&[("cart_item_id", item.as_str())]));

    let cart = cart_view(&state, &session).await?;
    Ok((AppendHeaders([CART_UPDATED]), CartItemsTemplate { cart }))
}

/// Empty the cart (HTMX).
///
/// Returns the (now empty) cart items fragment.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: SessionId) -> Result<impl IntoResponse> {
    state.carts().clear_cart(&session).await?;
    add_breadcrumb("cart", "Cleared cart", None);

    let cart = cart_view(&state, &session).await?;
    Ok((AppendHeaders([CART_UPDATED]), CartItemsTemplate { cart }))
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: SessionId) -> Result<impl IntoResponse> {
    let count = state.carts().item_count(&session).await?;
    Ok(CartCountTemplate { count })
}
