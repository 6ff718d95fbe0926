//! 会话管理
//!
//! 登录会话的持久化与自动登出：
//! - [`SessionStore`] - 存储后端 trait (内存 / JSON 文件)
//! - [`Session`] - 当前会话 + 到期自动登出定时器
//!
//! 定时器按令牌的 `exp` 声明倒计时，封顶 24 小时；显式登出取消
//! 定时器，服务端返回 401/403 时会话同样被清除。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use shared::models::UserPublic;

/// 会话最长存活时间 (秒)，令牌声明更久也按这个封顶
pub const MAX_SESSION_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 持久化的会话数据
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user: UserPublic,
}

/// 从 JWT token 中解析过期时间 (Unix timestamp)
pub fn parse_jwt_exp(token: &str) -> Option<u64> {
    // JWT 格式: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    // 解码 payload (base64url)
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let payload_str = String::from_utf8(payload_bytes).ok()?;

    // 解析 JSON 提取 exp 字段
    let payload: serde_json::Value = serde_json::from_str(&payload_str).ok()?;
    payload.get("exp")?.as_u64()
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 令牌剩余存活时间，封顶 [`MAX_SESSION_SECS`]
///
/// 没有 `exp` 声明的令牌按封顶值处理。
fn token_ttl(token: &str) -> Duration {
    let capped = match parse_jwt_exp(token) {
        Some(exp) => exp.saturating_sub(unix_now()).min(MAX_SESSION_SECS),
        None => MAX_SESSION_SECS,
    };
    Duration::from_secs(capped)
}

// ============================================================================
// Stores
// ============================================================================

/// 会话存储后端
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionData>, SessionError>;
    fn save(&self, session: &SessionData) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// 内存会话存储 (进程退出即失)
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn save(&self, session: &SessionData) -> Result<(), SessionError> {
        *self.inner.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.inner.lock().unwrap() = None;
        Ok(())
    }
}

/// JSON 文件会话存储
///
/// 跨进程保留登录状态，重启后通过 [`Session::restore`] 恢复。
#[derive(Debug)]
pub struct FileSessionStore {
    file_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// 默认文件名 `session.json`，放在给定目录下
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("session.json"))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.file_path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, session: &SessionData) -> Result<(), SessionError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.file_path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if self.file_path.exists() {
            std::fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}

// ============================================================================
// Session
// ============================================================================

/// 当前登录会话
///
/// 内存里的 `current` 是权威状态，store 只做持久化；两者在
/// open/close/到期时同步更新。克隆共享同一份状态。
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    current: Arc<Mutex<Option<SessionData>>>,
    timer: Arc<Mutex<Option<CancellationToken>>>,
}

impl Session {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            current: Arc::new(Mutex::new(None)),
            timer: Arc::new(Mutex::new(None)),
        }
    }

    /// 纯内存会话 (不持久化)
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    /// 从存储恢复上次的会话
    ///
    /// 令牌已过期的存档直接清除并返回 `None`；有效会话重新武装
    /// 自动登出定时器。
    pub fn restore(&self) -> Result<Option<SessionData>, SessionError> {
        let Some(data) = self.store.load()? else {
            return Ok(None);
        };

        let ttl = token_ttl(&data.token);
        if ttl.is_zero() {
            self.store.clear()?;
            tracing::info!(username = %data.user.username, "Stored session expired, cleared");
            return Ok(None);
        }

        *self.current.lock().unwrap() = Some(data.clone());
        self.arm_logout_timer(ttl);
        tracing::info!(username = %data.user.username, "Restored session");
        Ok(Some(data))
    }

    /// 登录成功后记录会话并启动自动登出
    pub fn open(&self, token: &str, user: UserPublic) -> Result<(), SessionError> {
        let data = SessionData {
            token: token.to_string(),
            user,
        };
        self.store.save(&data)?;
        let ttl = token_ttl(&data.token);
        *self.current.lock().unwrap() = Some(data);
        self.arm_logout_timer(ttl);
        Ok(())
    }

    /// 当前令牌
    pub fn token(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(|d| d.token.clone())
    }

    /// 当前登录用户
    pub fn user(&self) -> Option<UserPublic> {
        self.current.lock().unwrap().as_ref().map(|d| d.user.clone())
    }

    pub fn is_active(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    /// 显式登出：取消定时器、清内存、清存储
    pub fn close(&self) -> Result<(), SessionError> {
        self.disarm_logout_timer();
        *self.current.lock().unwrap() = None;
        self.store.clear()
    }

    /// 服务端拒绝后的会话失效 (401/403)，存储清理失败只记日志
    pub fn invalidate(&self) {
        self.disarm_logout_timer();
        let was_active = self.current.lock().unwrap().take().is_some();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear rejected session from store");
        }
        if was_active {
            tracing::warn!("Session invalidated after server rejection");
        }
    }

    /// 武装自动登出定时器，替换掉旧的
    fn arm_logout_timer(&self, ttl: Duration) {
        let token = CancellationToken::new();
        if let Some(old) = self.timer.lock().unwrap().replace(token.clone()) {
            old.cancel();
        }

        let store = Arc::clone(&self.store);
        let current = Arc::clone(&self.current);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(ttl) => {
                    *current.lock().unwrap() = None;
                    if let Err(e) = store.clear() {
                        tracing::warn!(error = %e, "Failed to clear expired session from store");
                    }
                    tracing::info!("Session expired, logged out");
                }
                _ = token.cancelled() => {}
            }
        });
    }

    fn disarm_logout_timer(&self) {
        if let Some(token) = self.timer.lock().unwrap().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::Role;

    fn test_user() -> UserPublic {
        UserPublic {
            id: "user:alice".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Customer,
        }
    }

    /// 无签名校验的测试令牌，payload 只带 exp
    fn token_with_exp(exp: u64) -> String {
        use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user:alice","exp":{}}}"#, exp));
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn jwt_exp_extraction() {
        assert_eq!(parse_jwt_exp(&token_with_exp(1234567890)), Some(1234567890));
        assert_eq!(parse_jwt_exp("not-a-jwt"), None);
        assert_eq!(parse_jwt_exp("a.b.c"), None);
    }

    #[test]
    fn ttl_is_capped_at_one_day() {
        let far_future = unix_now() + 10 * MAX_SESSION_SECS;
        assert_eq!(
            token_ttl(&token_with_exp(far_future)),
            Duration::from_secs(MAX_SESSION_SECS)
        );

        let expired = unix_now().saturating_sub(60);
        assert!(token_ttl(&token_with_exp(expired)).is_zero());

        // exp 缺失按封顶值
        assert_eq!(
            token_ttl("x.y.z"),
            Duration::from_secs(MAX_SESSION_SECS)
        );
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::in_dir(dir.path());

        assert!(store.load().unwrap().is_none());

        let data = SessionData {
            token: token_with_exp(unix_now() + 3600),
            user: test_user(),
        };
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), Some(data));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // clear 幂等
        store.clear().unwrap();
    }

    #[tokio::test]
    async fn open_and_close_life_cycle() {
        let session = Session::in_memory();
        assert!(!session.is_active());

        session
            .open(&token_with_exp(unix_now() + 3600), test_user())
            .unwrap();
        assert!(session.is_active());
        assert!(session.token().is_some());
        assert_eq!(session.user().unwrap().username, "alice");

        session.close().unwrap();
        assert!(!session.is_active());
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn restore_drops_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::in_dir(dir.path());
        store
            .save(&SessionData {
                token: token_with_exp(unix_now().saturating_sub(10)),
                user: test_user(),
            })
            .unwrap();

        let session = Session::new(FileSessionStore::in_dir(dir.path()));
        assert!(session.restore().unwrap().is_none());
        assert!(!session.is_active());
        // 过期存档已被清掉
        assert!(FileSessionStore::in_dir(dir.path()).load().unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_rearms_valid_sessions() {
        let dir = tempfile::tempdir().unwrap();
        FileSessionStore::in_dir(dir.path())
            .save(&SessionData {
                token: token_with_exp(unix_now() + 3600),
                user: test_user(),
            })
            .unwrap();

        let session = Session::new(FileSessionStore::in_dir(dir.path()));
        let restored = session.restore().unwrap().unwrap();
        assert_eq!(restored.user.username, "alice");
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn expiry_timer_clears_the_session() {
        let session = Session::in_memory();
        // exp 已过 → TTL 为零，定时器立即触发
        session
            .open(&token_with_exp(unix_now().saturating_sub(10)), test_user())
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn invalidate_clears_state_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(FileSessionStore::in_dir(dir.path()));
        session
            .open(&token_with_exp(unix_now() + 3600), test_user())
            .unwrap();

        session.invalidate();
        assert!(!session.is_active());
        assert!(FileSessionStore::in_dir(dir.path()).load().unwrap().is_none());
    }
}
