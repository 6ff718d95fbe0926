//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::db::repository::UserRepository;
use crate::security_log;
use crate::utils::error::AppError;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT，
/// 再从数据库确认用户仍然存在 (令牌可能指向已删除账号)。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `POST /api/auth/register`, `POST /api/auth/login`
/// - `POST /api/payments/webhook` (签名自带验证)
/// - `GET /api/products`, `GET /api/products/{id}` (公开目录)
/// - `GET /api/reviews/**` (公开评价读取，`my-reviews` 除外)
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_api_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string());

    let user = authenticate(&state, auth_header.as_deref(), req.uri()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// 公共 API 路由判定
///
/// 与各资源路由保持一致：注册/登录/webhook 开放 POST，
/// 商品目录与评价读取开放 GET。
fn is_public_api_route(method: &http::Method, path: &str) -> bool {
    if method == http::Method::POST {
        return matches!(
            path,
            "/api/auth/register" | "/api/auth/login" | "/api/payments/webhook"
        );
    }

    if method == http::Method::GET {
        if path == "/api/products" || path.starts_with("/api/products/") {
            return true;
        }
        // my-reviews 列出当前用户的评价，必须登录
        if path.starts_with("/api/reviews/") && path != "/api/reviews/my-reviews" {
            return true;
        }
    }

    false
}

/// 令牌验证 + 数据库用户确认
///
/// 中间件与提取器共用，错误消息直接作为响应体返回。
pub(crate) async fn authenticate(
    state: &ServerState,
    auth_header: Option<&str>,
    uri: &http::Uri,
) -> Result<CurrentUser, AppError> {
    let token = match auth_header {
        Some(header) => match JwtService::extract_from_header(header) {
            Some(token) => token,
            None => {
                security_log!("WARN", "auth_malformed_header", uri = format!("{:?}", uri));
                return Err(AppError::not_logged_in());
            }
        },
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", uri));
            return Err(AppError::not_logged_in());
        }
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", uri)
            );
            return Err(match e {
                crate::auth::JwtError::ExpiredToken => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            });
        }
    };

    // 令牌有效但账号可能已被删除，以数据库为准
    let repo = UserRepository::new(state.db());
    let user = repo
        .find_by_id(&claims.sub)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            security_log!("WARN", "auth_user_gone", sub = claims.sub.clone());
            AppError::Unauthorized(
                "The user belonging to this token does no longer exist.".to_string(),
            )
        })?;

    Ok(CurrentUser::from(user))
}

/// 管理员中间件 - 要求管理员角色
///
/// 非管理员返回 403
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_logged_in)?;

    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.to_string(),
            username = user.username.clone()
        );
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_and_public_reads_skip_auth() {
        assert!(is_public_api_route(
            &http::Method::POST,
            "/api/auth/register"
        ));
        assert!(is_public_api_route(&http::Method::POST, "/api/auth/login"));
        assert!(is_public_api_route(
            &http::Method::POST,
            "/api/payments/webhook"
        ));
        assert!(is_public_api_route(&http::Method::GET, "/api/products"));
        assert!(is_public_api_route(
            &http::Method::GET,
            "/api/products/product:abc"
        ));
        assert!(is_public_api_route(
            &http::Method::GET,
            "/api/reviews/product/product:abc"
        ));
        assert!(is_public_api_route(
            &http::Method::GET,
            "/api/reviews/review:xyz"
        ));
    }

    #[test]
    fn protected_routes_are_not_public() {
        assert!(!is_public_api_route(
            &http::Method::GET,
            "/api/reviews/my-reviews"
        ));
        assert!(!is_public_api_route(&http::Method::GET, "/api/auth/me"));
        assert!(!is_public_api_route(&http::Method::POST, "/api/products"));
        assert!(!is_public_api_route(&http::Method::POST, "/api/orders"));
        assert!(!is_public_api_route(
            &http::Method::GET,
            "/api/orders/my-orders"
        ));
        assert!(!is_public_api_route(
            &http::Method::POST,
            "/api/reviews/product/product:abc"
        ));
        assert!(!is_public_api_route(
            &http::Method::GET,
            "/api/payments/webhook"
        ));
    }
}
