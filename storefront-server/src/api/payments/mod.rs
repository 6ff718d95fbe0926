//! Payment API Module

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// Payment router
///
/// webhook 不经过登录校验，签名验证就是它的鉴权。
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/create-payment-intent", post(handler::create_intent))
        .route("/status/{order_id}", get(handler::get_status))
        .route("/webhook", post(handler::webhook))
}
