//! Checkout, stock movement and order lifecycle over the real router.
//! Run: cargo test -p storefront-server --test order_workflow

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

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
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

async fn create_product(app: &Router, admin: &str, name: &str, price: f64, stock: i64) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/products",
        Some(admin),
        Some(json!({
            "name": name,
            "description": format!("{name} description"),
            "price": price,
            "stock": stock,
            "category": "smartphone",
            "brand": "Acme",
            "imageUrl": "https://example.com/product.jpg"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["product"]["id"].as_str().unwrap().to_string()
}

fn address() -> Value {
    json!({
        "street": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "postalCode": "62701",
        "country": "USA"
    })
}

fn order_body(items: Value) -> Value {
    json!({
        "items": items,
        "shippingAddress": address(),
        "paymentMethod": "credit_card"
    })
}

async fn stock_of(app: &Router, product_id: &str) -> i64 {
    let (status, body) =
        request(app, "GET", &format!("/api/products/{product_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["product"]["stock"].as_i64().unwrap()
}

#[tokio::test]
async fn checkout_decrements_stock_and_freezes_prices() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;
    let customer = register(&app, "alice").await;

    let product = create_product(&app, &admin, "iPhone 15", 25.0, 10).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(json!([{"product": product, "quantity": 3}]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "order failed: {body}");
    let order = &body["data"]["order"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["totalAmount"].as_f64(), Some(75.0));
    assert_eq!(order["items"][0]["name"], "iPhone 15");
    assert_eq!(order["items"][0]["price"].as_f64(), Some(25.0));
    assert_eq!(order["shippingAddress"]["postalCode"], "62701");
    let order_id = order["id"].as_str().unwrap().to_string();

    assert_eq!(stock_of(&app, &product).await, 7);

    // later catalog edits do not reach the frozen line items
    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/products/{product}"),
        Some(&admin),
        Some(json!({"price": 30.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        request(&app, "GET", &format!("/api/orders/{order_id}"), Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["items"][0]["price"].as_f64(), Some(25.0));
    assert_eq!(body["data"]["order"]["totalAmount"].as_f64(), Some(75.0));
}

#[tokio::test]
async fn oversell_rejects_without_partial_decrement() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;
    let customer = register(&app, "bob").await;

    let plenty = create_product(&app, &admin, "Charger", 19.0, 5).await;
    let scarce = create_product(&app, &admin, "Rare Phone", 899.0, 2).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(json!([
            {"product": plenty, "quantity": 3},
            {"product": scarce, "quantity": 3}
        ]))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Not enough stock available for Rare Phone");

    // the first line's decrement was rolled back with the rest
    assert_eq!(stock_of(&app, &plenty).await, 5);
    assert_eq!(stock_of(&app, &scarce).await, 2);
}

#[tokio::test]
async fn cancel_restores_stock_exactly_once() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;
    let customer = register(&app, "carol").await;

    let product = create_product(&app, &admin, "Tablet Mini", 349.0, 10).await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(json!([{"product": product, "quantity": 4}]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();
    assert_eq!(stock_of(&app, &product).await, 6);

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}/cancel"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "cancelled");
    assert_eq!(stock_of(&app, &product).await, 10);

    // a second cancel must not restore stock again
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}/cancel"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot cancel an order that has been shipped or delivered"
    );
    assert_eq!(stock_of(&app, &product).await, 10);
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;
    let customer = register(&app, "dave").await;

    let product = create_product(&app, &admin, "Earbuds", 129.0, 8).await;

    let (_, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(json!([{"product": product, "quantity": 2}]))),
    )
    .await;
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}/status"),
        Some(&admin),
        Some(json!({"status": "shipped"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "shipped");

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}/cancel"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot cancel an order that has been shipped or delivered"
    );
    assert_eq!(stock_of(&app, &product).await, 6);
}

#[tokio::test]
async fn order_reads_enforce_ownership() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;
    let alice = register(&app, "alice").await;
    let mallory = register(&app, "mallory").await;

    let product = create_product(&app, &admin, "Phone Case", 15.0, 20).await;

    let (_, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&alice),
        Some(order_body(json!([{"product": product, "quantity": 1}]))),
    )
    .await;
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();

    let (status, body) =
        request(&app, "GET", &format!("/api/orders/{order_id}"), Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You do not have permission to view this order"
    );

    // admins can read any order, with the owner projected
    let (status, body) =
        request(&app, "GET", &format!("/api/orders/{order_id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["user"]["username"], "alice");

    let (status, body) = request(&app, "GET", "/api/orders/my-orders", Some(&mallory), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 0);

    let (status, body) = request(&app, "GET", "/api/orders/my-orders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 1);

    // the full listing is admin-only
    let (status, _) = request(&app, "GET", "/api/orders", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(&app, "GET", "/api/orders", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], 1);
}

#[tokio::test]
async fn checkout_rejects_bad_payloads() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let customer = register(&app, "erin").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(json!([]))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order must contain at least one item");

    let (status, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(json!([{"product": "product:ghost", "quantity": 1}]))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product with ID product:ghost not found");

    let (status, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(json!({
            "items": [{"product": "product:p1", "quantity": 1}],
            "shippingAddress": address(),
            "paymentMethod": "bitcoin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payment method");
}

#[tokio::test]
async fn admin_payment_override_records_details() {
    let tmp = tempfile::tempdir().unwrap();
    let app = test_app(&tmp).await;
    let admin = admin_token(&app).await;
    let customer = register(&app, "frank").await;

    let product = create_product(&app, &admin, "Screen Protector", 9.5, 50).await;

    let (_, body) = request(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(json!([{"product": product, "quantity": 2}]))),
    )
    .await;
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}/payment"),
        Some(&customer),
        Some(json!({"paymentStatus": "paid"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}/payment"),
        Some(&admin),
        Some(json!({"paymentStatus": "paid", "transactionId": "tx_manual_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["paymentStatus"], "paid");
    assert_eq!(
        body["data"]["order"]["paymentDetails"]["transactionId"],
        "tx_manual_1"
    );
}
