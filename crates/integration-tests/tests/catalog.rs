//! Integration tests for public catalog pages, probes and static files.

use axum::http::StatusCode;

use ward4woods_integration_tests::TestApp;

// =============================================================================
// Probes and Middleware
// =============================================================================

#[tokio::test]
async fn test_health_probes() {
    let app = TestApp::new();

    let live = app.get("/health", None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.get("/health/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::new();

    let response = app.get("/", None).await;
    assert_eq!(response.header("x-frame-options"), Some("DENY"));
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert!(response.header("content-security-policy").is_some());
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-1234")
        .body(axum::body::Body::empty())
        .expect("build request");

    let response = app.request(request).await;
    assert_eq!(response.header("x-request-id"), Some("edge-1234"));
}

// =============================================================================
// Product Pages
// =============================================================================

#[tokio::test]
async fn test_home_features_newest_products() {
    let app = TestApp::new();
    for (name, cents) in [("One", 100), ("Two", 200), ("Three", 300), ("Four", 400), ("Five", 500)] {
        app.seed_product(name, cents, "Test").await;
    }

    let response = app.get("/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Five"));
    assert!(response.body.contains("Two"));
    assert!(!response.body.contains(">One<"));
}

#[tokio::test]
async fn test_listing_shows_products_with_placeholder_image() {
    let app = TestApp::new();
    let board = app.seed_product("Walnut Board", 4500, "Kitchen").await;
    let stool = app.seed_product("Oak Stool", 12000, "Furniture").await;
    let image = app.seed_image(stool, true).await;

    let response = app.get("/products", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Walnut Board"));
    assert!(response.body.contains("$45.00"));
    assert!(response.body.contains(&format!("href=\"/products/{board}\"")));
    assert!(response.body.contains("/images/no-image.png"));
    assert!(response.body.contains(&format!("/images/{image}")));
}

#[tokio::test]
async fn test_empty_listing() {
    let app = TestApp::new();

    let response = app.get("/products", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Nothing in the shop"));
}

#[tokio::test]
async fn test_product_detail_shows_main_and_other_images() {
    let app = TestApp::new();
    let product = app.seed_product("Oak Stool", 12000, "Furniture").await;
    let side = app.seed_image(product, false).await;
    let main = app.seed_image(product, true).await;

    let response = app.get(&format!("/products/{product}"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Oak Stool"));
    assert!(response.body.contains("$120.00"));
    assert!(response.body.contains(&format!("class=\"main-image\" src=\"/images/{main}\"")));
    assert!(response.body.contains(&format!("/images/{side}")));
    assert!(response.body.contains(&format!("hx-post=\"/cart/{product}\"")));
}

#[tokio::test]
async fn test_product_without_images_uses_placeholder() {
    let app = TestApp::new();
    let product = app.seed_product("Cedar Box", 3000, "Storage").await;

    let response = app.get(&format!("/products/{product}"), None).await;
    assert!(response.body.contains("src=\"/images/no-image.png\""));
    assert!(!response.body.contains("class=\"thumbnails\""));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let app = TestApp::new();

    let response = app.get("/products/404", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/products/walnut-board", None).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_options_mark_own_category() {
    let app = TestApp::new();
    let stool = app.seed_product("Oak Stool", 12000, "Furniture").await;
    app.seed_product("Walnut Board", 4500, "Kitchen").await;

    let response = app.get(&format!("/products/categories/{stool}"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<option value=\"Furniture\" selected>"));
    assert!(response.body.contains("<option value=\"Kitchen\">"));

    let missing = app.get("/products/categories/99", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Static Files
// =============================================================================

#[tokio::test]
async fn test_static_and_image_files_are_served() {
    let app = TestApp::new();

    let css = app.get("/static/css/main.css", None).await;
    assert_eq!(css.status, StatusCode::OK);

    let placeholder = app.get("/images/no-image.png", None).await;
    assert_eq!(placeholder.status, StatusCode::OK);
    assert_eq!(placeholder.header("content-type"), Some("image/png"));

    let missing = app.get("/images/nope.png", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
