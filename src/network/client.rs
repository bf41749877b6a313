use std::sync::Arc;

use reqwest::Response;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::core::error::{Result, SourceError};
use crate::network::service::HttpService;
use crate::network::session::Session;

/// 面向书源的 HTTP 客户端封装
#[derive(Clone)]
pub struct SourceClient {
    pub http: Arc<HttpService>,
    pub session: Arc<Session>,
}

impl SourceClient {
    pub fn new(http: Arc<HttpService>, session: Session) -> Self {
        Self {
            http,
            session: Arc::new(session),
        }
    }

    /// 执行通用 GET 请求
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.http
            .execute(reqwest::Method::GET, url, self.session.clone())
            .await
    }

    /// 获取文本内容
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.get(url).await?;
        resp.text().await.map_err(SourceError::Network)
    }

    /// 获取并反序列化 JSON
    ///
    /// 先取文本再解析，书源常以 `text/html` 返回 JSON 正文。
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get_text(url).await?;
        serde_json::from_str(&text).map_err(SourceError::Serialization)
    }
}

/// 读取响应的 Content-Type，缺失时为空串
pub fn content_type(resp: &Response) -> String {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}
