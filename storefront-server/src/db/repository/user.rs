//! User Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{User, UserCreate};
use shared::time::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

/// 注册冲突的统一提示，避免泄露具体是哪个字段已被占用
const DUPLICATE_USER: &str = "A user with that email or username already exists";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let Ok(thing) = id.parse::<RecordId>() else {
            return Ok(None);
        };
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let username_owned = username.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user
    ///
    /// 先查重，唯一索引作为并发兜底；两条路径返回同一提示。
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        if self.find_by_email(&data.email).await?.is_some()
            || self.find_by_username(&data.username).await?.is_some()
        {
            return Err(RepoError::Duplicate(DUPLICATE_USER.to_string()));
        }

        let hash_pass = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    username = $username,
                    email = $email,
                    hash_pass = $hash_pass,
                    role = $role,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("username", data.username))
            .bind(("email", data.email))
            .bind(("hash_pass", hash_pass))
            .bind(("role", data.role))
            .bind(("created_at", now_millis()))
            .await;

        let mut result = match result {
            Ok(r) => r,
            Err(e) => return Err(map_duplicate(e.into())),
        };

        let created: Option<User> = result.take(0).map_err(|e| map_duplicate(e.into()))?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }
}

/// 唯一索引冲突改写为统一提示，其他错误原样返回
fn map_duplicate(err: RepoError) -> RepoError {
    match err {
        RepoError::Duplicate(_) => RepoError::Duplicate(DUPLICATE_USER.to_string()),
        other => other,
    }
}
