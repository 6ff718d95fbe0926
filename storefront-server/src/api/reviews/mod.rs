//! Review API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Review router
///
/// 商品评价与单条评价的 GET 公开，其余操作需要登录。
/// `/my-reviews` 是静态段，优先于 `/{id}` 匹配。
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/product/{product_id}",
            get(handler::product_reviews).post(handler::create),
        )
        .route("/my-reviews", get(handler::my_reviews))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
}
