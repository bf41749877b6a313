use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

use crate::core::config::HttpConfig;
use crate::core::error::{Result, SourceError};
use crate::network::middleware::{LoggingMiddleware, SessionMiddleware};
use crate::network::session::Session;

/// 共享 HTTP 服务
///
/// 所有书源共用同一个连接池，书源差异由请求级 `Session` 扩展承载。
#[derive(Clone)]
pub struct HttpService {
    client: ClientWithMiddleware,
}

impl HttpService {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: Self::try_build_internal_client(config)?,
        })
    }

    /// 构建底层的 HTTP 客户端
    fn try_build_internal_client(config: &HttpConfig) -> Result<ClientWithMiddleware> {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_nodelay(true)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(SourceError::Network)?;

        Ok(ClientBuilder::new(client)
            .with(SessionMiddleware)
            .with(LoggingMiddleware)
            .build())
    }

    /// 以书源 Session 发起请求，非 2xx 状态视为错误
    pub async fn execute(
        &self,
        method: reqwest::Method,
        url: &str,
        session: Arc<Session>,
    ) -> Result<reqwest::Response> {
        let resp = self
            .client
            .request(method, url)
            .with_extension(session)
            .send()
            .await
            .map_err(SourceError::Middleware)?;

        resp.error_for_status().map_err(SourceError::Network)
    }
}
