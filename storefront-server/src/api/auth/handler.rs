//! Authentication Handlers
//!
//! Handles registration, login and current-user lookup

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::UserCreate;
use crate::db::repository::UserRepository;
use crate::utils::error::{AppError, AppResult};
use shared::Role;
use shared::models::UserPublic;
use shared::response::{AuthResponse, DataResponse, UserPayload};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// 注册请求体
///
/// 字段全部宽松接收，约束检查在 [`RegisterPayload::validate`] 里按序执行，
/// 第一条失败的规则作为响应消息返回。
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl RegisterPayload {
    fn validate(self) -> Result<(String, String, String), AppError> {
        let username = self.username.unwrap_or_default().trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }
        if username.chars().count() < 3 {
            return Err(AppError::Validation(
                "Username must be at least 3 characters".to_string(),
            ));
        }
        if username.chars().count() > 30 {
            return Err(AppError::Validation(
                "Username cannot exceed 30 characters".to_string(),
            ));
        }

        let email = self.email.unwrap_or_default().trim().to_string();
        if email.is_empty() {
            return Err(AppError::Validation("Email is required".to_string()));
        }
        if !email.validate_email() {
            return Err(AppError::Validation(
                "Please provide a valid email".to_string(),
            ));
        }

        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        if password.chars().count() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        Ok((username, email, password))
    }
}

/// 登录请求体
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl LoginPayload {
    fn validate(self) -> Result<(String, String), AppError> {
        let email = self.email.unwrap_or_default().trim().to_string();
        if email.is_empty() {
            return Err(AppError::Validation("Email is required".to_string()));
        }
        if !email.validate_email() {
            return Err(AppError::Validation(
                "Please provide a valid email".to_string(),
            ));
        }

        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        Ok((email, password))
    }
}

/// Register handler
///
/// Creates a customer account and returns a signed token
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (username, email, password) = payload.validate()?;
    // 邮箱统一小写存储，查询同样小写后比对
    let email = email.to_lowercase();

    let repo = UserRepository::new(state.db());
    let user = repo
        .create(UserCreate {
            username,
            email,
            password,
            role: Role::Customer,
        })
        .await?;

    let token = state
        .jwt_service
        .generate_token(&user.id.to_string(), &user.username, user.role)
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        "User registered successfully"
    );

    let public = user.to_public();
    Ok((StatusCode::CREATED, Json(AuthResponse::success(token, public))))
}

/// Login handler
///
/// Authenticates user credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<Json<AuthResponse>> {
    let (email, password) = payload.validate()?;
    let email = email.to_lowercase();

    let repo = UserRepository::new(state.db());
    let user = repo.find_by_email(&email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Check authentication result - unified error message to prevent email enumeration
    let user = match user {
        Some(u) => {
            let password_valid = u
                .verify_password(&password)
                .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                tracing::warn!(email = %email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            tracing::warn!(email = %email, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let token = state
        .jwt_service
        .generate_token(&user.id.to_string(), &user.username, user.role)
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        "User logged in successfully"
    );

    let public = user.to_public();
    Ok(Json(AuthResponse::success(token, public)))
}

/// Get current user info
pub async fn me(user: CurrentUser) -> AppResult<Json<DataResponse<UserPayload>>> {
    let public = UserPublic {
        id: user.id.to_string(),
        username: user.username,
        email: user.email,
        role: user.role,
    };

    Ok(Json(DataResponse::success(UserPayload { user: public })))
}
