// storefront-client/src/http.rs
// HTTP 传输层 - 网络通信

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use shared::response::ErrorBody;

/// HTTP 传输 trait
///
/// Bearer token 由调用方按请求传入，传输层只负责携带。
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get<T: DeserializeOwned>(&self, path: &str, bearer: Option<&str>) -> ClientResult<T>;

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> ClientResult<T>;

    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> ClientResult<T>;

    async fn patch<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> ClientResult<T>;

    /// PATCH without a body (e.g. order cancellation)
    async fn patch_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> ClientResult<T>;

    /// DELETE expecting `204 No Content`
    async fn delete(&self, path: &str, bearer: Option<&str>) -> ClientResult<()>;
}

/// 网络 HTTP 客户端
///
/// 30 秒超时；传输层错误 (连接失败、超时) 重试一次后才上抛。
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
    retry_on_transport_error: bool,
}

impl NetworkHttpClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_on_transport_error: config.retry_on_transport_error,
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn attach_bearer(
        request: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match bearer {
            Some(token) => request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token),
            ),
            None => request,
        }
    }

    /// 发送请求，传输层错误重试一次
    ///
    /// 只有拿不到任何响应时才重试 (连接失败/超时)；服务端已经应答的
    /// 请求绝不重发。
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let retry = if self.retry_on_transport_error {
            request.try_clone()
        } else {
            None
        };

        match request.send().await {
            Ok(response) => Ok(response),
            Err(err) => {
                let retriable = err.is_connect() || err.is_timeout();
                match retry {
                    Some(retry) if retriable => {
                        tracing::debug!(error = %err, "Transport error, retrying once");
                        retry.send().await
                    }
                    _ => Err(err),
                }
            }
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response.text().await?));
        }
        Ok(response.json().await?)
    }

    /// 状态码 → 错误变体；消息优先取错误信封的 `message` 字段
    fn error_from(status: StatusCode, text: String) -> ClientError {
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.message,
            Err(_) => text,
        };
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            _ => ClientError::Internal(message),
        }
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn get<T: DeserializeOwned>(&self, path: &str, bearer: Option<&str>) -> ClientResult<T> {
        let req = Self::attach_bearer(self.client.get(self.url(path)), bearer);
        let response = self.send(req).await?;
        self.handle_response(response).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> ClientResult<T> {
        let req = Self::attach_bearer(self.client.get(self.url(path)).query(query), bearer);
        let response = self.send(req).await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> ClientResult<T> {
        let req = Self::attach_bearer(self.client.post(self.url(path)).json(body), bearer);
        let response = self.send(req).await?;
        self.handle_response(response).await
    }

    async fn patch<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> ClientResult<T> {
        let req = Self::attach_bearer(self.client.patch(self.url(path)).json(body), bearer);
        let response = self.send(req).await?;
        self.handle_response(response).await
    }

    async fn patch_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> ClientResult<T> {
        let req = Self::attach_bearer(self.client.patch(self.url(path)), bearer);
        let response = self.send(req).await?;
        self.handle_response(response).await
    }

    async fn delete(&self, path: &str, bearer: Option<&str>) -> ClientResult<()> {
        let req = Self::attach_bearer(self.client.delete(self.url(path)), bearer);
        let response = self.send(req).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response.text().await?));
        }
        Ok(())
    }
}
