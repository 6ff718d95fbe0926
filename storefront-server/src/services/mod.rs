//! 后台服务模块

pub mod notify;

pub use notify::NotificationService;
