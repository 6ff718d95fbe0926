use std::path::Path;
use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::models::UserCreate;
use crate::db::repository::UserRepository;
use crate::services::NotificationService;
use crate::utils::error::AppError;
use shared::Role;

/// 服务器状态 - 持有所有服务的单例引用
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | notify | NotificationService | 订单通知服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: DbService,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 订单通知服务
    pub notify: NotificationService,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 数据库 (打开 RocksDB 并应用 schema)
    /// 2. JWT 服务 (从配置读取密钥)
    /// 3. 通知服务
    /// 4. 种子管理员 (仅当 ADMIN_EMAIL 与 ADMIN_PASSWORD 都设置时)
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(Path::new(&config.db_path)).await?;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let notify = NotificationService::new(
            config.notify_gateway_url.clone(),
            config.notify_from.clone(),
        );

        let state = Self {
            config: config.clone(),
            db,
            jwt_service,
            notify,
        };

        state.seed_admin().await?;

        Ok(state)
    }

    /// 获取数据库实例
    pub fn db(&self) -> Surreal<Db> {
        self.db.db()
    }

    /// 创建种子管理员账号
    ///
    /// 邮箱已存在时跳过，保证重启幂等。
    async fn seed_admin(&self) -> Result<(), AppError> {
        let (Some(email), Some(password)) = (
            self.config.admin_email.clone(),
            self.config.admin_password.clone(),
        ) else {
            return Ok(());
        };

        let repo = UserRepository::new(self.db());
        let email = email.to_lowercase();
        if repo.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let admin = repo
            .create(UserCreate {
                username: self.config.admin_username.clone(),
                email,
                password,
                role: Role::Admin,
            })
            .await?;
        tracing::info!(username = %admin.username, "Seed admin account created");

        Ok(())
    }
}
