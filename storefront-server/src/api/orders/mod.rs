//! Order API Module

mod handler;

use axum::{Router, middleware, routing::get, routing::patch, routing::post};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 用户路由：下单、查看与取消自己的订单
    let user_routes = Router::new()
        .route("/", post(handler::create))
        .route("/my-orders", get(handler::my_orders))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", patch(handler::cancel));

    // 管理路由：全量列表与状态流转，仅管理员可用
    let admin_routes = Router::new()
        .route("/", get(handler::list_all))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/payment", patch(handler::update_payment))
        .layer(middleware::from_fn(require_admin));

    user_routes.merge(admin_routes)
}
