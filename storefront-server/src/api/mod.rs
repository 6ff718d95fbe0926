//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、登录与当前用户
//! - [`products`] - 商品目录与管理
//! - [`orders`] - 订单与状态流转
//! - [`payments`] - 支付意图与 webhook
//! - [`reviews`] - 商品评价与评分聚合

pub mod auth;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
