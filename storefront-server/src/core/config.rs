use crate::auth::JwtConfig;

/// 服务器配置 - 店面后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | DB_PATH | data/storefront.db | 嵌入式数据库目录 |
/// | ENVIRONMENT | development | 运行环境 |
/// | STRIPE_SECRET_KEY | (空) | 支付处理器密钥 |
/// | STRIPE_WEBHOOK_SECRET | (空) | webhook 签名密钥 |
/// | NOTIFY_GATEWAY_URL | (未设置) | 通知网关地址，未设置时只记日志 |
/// | NOTIFY_FROM | Mobile Webshop <noreply@mobilewebshop.com> | 通知发件人 |
/// | ADMIN_EMAIL / ADMIN_USERNAME / ADMIN_PASSWORD | (未设置) | 启动时种子管理员 |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=8080 DB_PATH=/data/storefront cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 嵌入式数据库路径 (RocksDB 目录)
    pub db_path: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 支付处理器 ===
    /// Stripe API 密钥
    pub stripe_secret_key: String,
    /// Stripe webhook 签名密钥
    pub stripe_webhook_secret: String,

    // === 通知 ===
    /// 通知网关 URL，未配置时通知只记日志
    pub notify_gateway_url: Option<String>,
    /// 通知发件人
    pub notify_from: String,

    // === 种子管理员 ===
    /// 管理员邮箱，与密码同时设置时在启动时创建
    pub admin_email: Option<String>,
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "data/storefront.db".into()),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),

            notify_gateway_url: std::env::var("NOTIFY_GATEWAY_URL").ok(),
            notify_from: std::env::var("NOTIFY_FROM")
                .unwrap_or_else(|_| "Mobile Webshop <noreply@mobilewebshop.com>".into()),

            admin_email: std::env::var("ADMIN_EMAIL").ok(),
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(db_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.db_path = db_path.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
