//! 服务上下文 (ServiceContext)
//!
//! 显式构造并向下传递的依赖集合，替代全局单例。

use std::sync::Arc;

use crate::core::config::{AppConfig, SourceConfig};
use crate::core::error::Result;
use crate::network::client::SourceClient;
use crate::network::service::HttpService;
use crate::network::session::Session;

/// 服务上下文
#[derive(Clone)]
pub struct ServiceContext {
    /// HTTP 服务
    pub http: Arc<HttpService>,
    /// 应用配置
    pub config: Arc<AppConfig>,
}

impl ServiceContext {
    pub fn new(config: Arc<AppConfig>) -> Result<Self> {
        let http = Arc::new(HttpService::new(&config.http)?);
        Ok(Self { http, config })
    }

    /// 书源配置覆盖
    pub fn source_config(&self, id: &str) -> SourceConfig {
        self.config.source(id)
    }

    /// 派生书源专用客户端
    ///
    /// 书源配置中的 UA 优先于书源自带的默认 UA。
    pub fn client_for(&self, id: &str, session: Session) -> SourceClient {
        let session = match self.config.source(id).user_agent {
            Some(ua) => session.with_ua(ua),
            None => session,
        };
        SourceClient::new(self.http.clone(), session)
    }
}
