//! 统一错误处理
//!
//! 提供应用级错误类型：
//! - [`AppError`] - 应用错误枚举
//! - [`AppResult`] - 带 AppError 的 Result 别名
//!
//! # 响应格式
//!
//! 所有错误以 `{status, message}` 返回：4xx 为 `fail`，5xx 为 `error`。
//!
//! ```json
//! { "status": "fail", "message": "No order found with that ID" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::db::repository::RepoError;
use shared::response::{ErrorBody, STATUS_ERROR, STATUS_FAIL};

pub type AppResult<T> = Result<T, AppError>;

/// 应用错误枚举
///
/// # 错误分类
///
/// | 分类 | 说明 |
/// |------|------|
/// | 认证错误 | 未登录、令牌过期、无效令牌 |
/// | 权限错误 | 非管理员、访问他人资源 |
/// | 业务逻辑错误 | 资源不存在、库存不足、非法状态转换 |
/// | 系统错误 | 数据库错误、内部错误 |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 (401) ==========
    #[error("{0}")]
    /// 未认证 (401)
    Unauthorized(String),

    #[error("Your token has expired! Please log in again.")]
    /// 令牌过期 (401)
    TokenExpired,

    #[error("Invalid token. Please log in again!")]
    /// 无效令牌 (401)
    InvalidToken,

    // ========== 权限错误 (403) ==========
    #[error("{0}")]
    /// 无权限 (403)
    Forbidden(String),

    // ========== 业务逻辑错误 (4xx) ==========
    #[error("{0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("{0}")]
    /// 唯一约束冲突 (409)
    Conflict(String),

    #[error("{0}")]
    /// 输入验证失败 (400)
    Validation(String),

    #[error("{0}")]
    /// 库存不足 (400)
    InsufficientStock(String),

    #[error("{0}")]
    /// 非法状态转换 (400)
    InvalidState(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::TokenExpired | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_)
            | AppError::InsufficientStock(_)
            | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a missing-token error with the canonical message
    pub fn not_logged_in() -> Self {
        Self::Unauthorized("You are not logged in! Please log in to get access.".to_string())
    }

    /// Unified login failure, identical for unknown email and wrong password
    pub fn invalid_credentials() -> Self {
        Self::Unauthorized("Incorrect email or password".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            // 5xx detail goes to the log, never to the client
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let label = if status.is_client_error() {
            STATUS_FAIL
        } else {
            STATUS_ERROR
        };

        let body = Json(ErrorBody {
            status: label.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::InsufficientStock(msg) => AppError::InsufficientStock(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}
