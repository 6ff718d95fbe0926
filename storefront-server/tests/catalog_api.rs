//! Catalog listing, filtering and admin management over the real router.
//! Run: cargo test -p storefront-server --test catalog_api

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use storefront_server::auth::JwtConfig;
use storefront_server::core::{Config, ServerState, build_router};

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        http_port: 0,
        db_path: dir.path().join("db").to_string_lossy().into_owned(),
        jwt: JwtConfig {
            secret: "integration-test-secret-key-0123456789".to_string(),
            expiration_minutes: 60,
            issuer: "storefront-server".to_string(),
            audience: "storefront-client".to_string(),
        },
        environment: "development".to_string(),
        stripe_secret_key: String::new(),
        stripe_webhook_secret: "whsec_integration_test".to_string(),
        notify_gateway_url: None,
        notify_from: "Mobile Webshop <noreply@mobilewebshop.com>".to_string(),
        admin_email: Some("admin@example.com".to_string()),
        admin_username: "admin".to_string(),
        admin_password: Some("admin-password-123".to_string()),
    }
}

async fn test_app(dir: &tempfile::TempDir) -> Router {
    let state = ServerState::initialize(&test_config(dir)).await.unwrap();
    build_router(state)
}

async fn request(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "admin@example.com", "password": "admin-password-123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_product(
    app: &Router,
    token: &str,
    name: &str,
    price: f64,
    stock: i64,
    category: &str,
    brand: &str,
) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/products",
        Some(token),
        Some(json!({
            "name": name,
            "description": format!("{name} description"),
            "price": price,
            "stock": stock,
            "category": category,
            "brand": brand,
            "imageUrl": "https://example.com/product.jpg"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["product"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn banner_health_and_fallback() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;

    let (status, body) = request(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Mobile Webshop API".to_string()));

    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = request(&app, "GET", "/no/such/route", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Can't find /no/such/route on this server!");
}

#[tokio::test]
async fn listing_filters_combine() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;

    create_product(&app, &admin, "iPhone 15 Pro", 999.99, 25, "smartphone", "Apple").await;
    create_product(&app, &admin, "Galaxy S24", 799.5, 0, "smartphone", "Samsung").await;
    create_product(&app, &admin, "iPad Air", 599.0, 12, "tablet", "Apple").await;

    // no filter: everything, public access
    let (status, body) = request(&app, "GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 3);
    assert_eq!(body["totalProducts"], 3);

    let (_, body) = request(&app, "GET", "/api/products?category=smartphone", None, None).await;
    assert_eq!(body["results"], 2);

    let (_, body) = request(&app, "GET", "/api/products?brand=Apple", None, None).await;
    assert_eq!(body["results"], 2);

    let (_, body) = request(
        &app,
        "GET",
        "/api/products?minPrice=700&maxPrice=900",
        None,
        None,
    )
    .await;
    assert_eq!(body["results"], 1);
    assert_eq!(body["data"]["products"][0]["name"], "Galaxy S24");

    // inStock drops the sold-out Galaxy
    let (_, body) = request(
        &app,
        "GET",
        "/api/products?category=smartphone&inStock=true",
        None,
        None,
    )
    .await;
    assert_eq!(body["results"], 1);
    assert_eq!(body["data"]["products"][0]["name"], "iPhone 15 Pro");

    let (_, body) = request(&app, "GET", "/api/products?search=ipad", None, None).await;
    assert_eq!(body["results"], 1);
    assert_eq!(body["data"]["products"][0]["name"], "iPad Air");

    // unknown category can never match: empty page, not an error
    let (status, body) = request(&app, "GET", "/api/products?category=laptop", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 0);
    assert_eq!(body["totalProducts"], 0);
}

#[tokio::test]
async fn pagination_math_and_sorting() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;

    for (name, price) in [
        ("Budget Phone", 199.0),
        ("Mid Phone", 499.0),
        ("Flagship Phone", 1199.0),
    ] {
        create_product(&app, &admin, name, price, 5, "smartphone", "Acme").await;
    }

    let (_, body) = request(&app, "GET", "/api/products?limit=2&page=1", None, None).await;
    assert_eq!(body["results"], 2);
    assert_eq!(body["totalProducts"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 1);

    let (_, body) = request(&app, "GET", "/api/products?limit=2&page=2", None, None).await;
    assert_eq!(body["results"], 1);
    assert_eq!(body["currentPage"], 2);

    let (_, body) = request(&app, "GET", "/api/products?sort=-price", None, None).await;
    assert_eq!(body["data"]["products"][0]["name"], "Flagship Phone");

    let (_, body) = request(&app, "GET", "/api/products?sort=price", None, None).await;
    assert_eq!(body["data"]["products"][0]["name"], "Budget Phone");

    // junk paging values fall back to defaults
    let (_, body) = request(&app, "GET", "/api/products?page=0&limit=abc", None, None).await;
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["results"], 3);
}

#[tokio::test]
async fn fields_projection_prunes_listing_objects() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;

    create_product(&app, &admin, "iPhone 15 Pro", 999.99, 25, "smartphone", "Apple").await;

    let (_, body) = request(&app, "GET", "/api/products?fields=name,price", None, None).await;
    let product = body["data"]["products"][0].as_object().unwrap();
    assert_eq!(product.len(), 3);
    assert!(product.contains_key("id"));
    assert!(product.contains_key("name"));
    assert!(product.contains_key("price"));
    assert!(!product.contains_key("stock"));
}

#[tokio::test]
async fn get_by_id_and_missing_product() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;

    let id = create_product(&app, &admin, "iPad Air", 599.0, 12, "tablet", "Apple").await;

    let (status, body) = request(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product"]["name"], "iPad Air");
    assert_eq!(body["data"]["product"]["price"].as_f64(), Some(599.0));
    assert_eq!(body["data"]["product"]["ratingsAverage"].as_f64(), Some(0.0));
    assert_eq!(body["data"]["product"]["ratingsQuantity"], 0);

    let (status, body) = request(&app, "GET", "/api/products/product:missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No product found with that ID");
}

#[tokio::test]
async fn admin_update_and_delete_lifecycle() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;

    let id = create_product(&app, &admin, "Galaxy S24", 799.0, 30, "smartphone", "Samsung").await;

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/products/{id}"),
        Some(&admin),
        Some(json!({"price": 749.5, "stock": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product"]["price"].as_f64(), Some(749.5));
    assert_eq!(body["data"]["product"]["stock"], 20);
    // untouched fields survive the partial update
    assert_eq!(body["data"]["product"]["name"], "Galaxy S24");

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/products/{id}"),
        Some(&admin),
        Some(json!({"price": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Price must be greater than 0");

    let (status, body) =
        request(&app, "DELETE", &format!("/api/products/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = request(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        request(&app, "DELETE", &format!("/api/products/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_validation_reports_first_failed_rule() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/products",
        Some(&admin),
        Some(json!({"name": "Thing", "description": "A thing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Price must be greater than 0");

    let (status, body) = request(
        &app,
        "POST",
        "/api/products",
        Some(&admin),
        Some(json!({
            "name": "Thing",
            "description": "A thing",
            "price": 10.0,
            "stock": 1,
            "category": "gadget",
            "brand": "Acme",
            "imageUrl": "https://example.com/x.jpg"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid category");
}
