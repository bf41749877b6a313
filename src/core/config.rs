//! 配置管理系统 (Configuration Management)
//!
//! 负责 `config.toml` 的反序列化及其层级结构映射，支持 `BOOKHUB__*` 环境变量覆盖与默认值回退机制。

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use bon::Builder;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::core::error::{Result, SourceError};

/// 浏览器风格的默认 UA
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct AppConfig {
    /// 出站 HTTP 客户端参数
    #[serde(default)]
    #[builder(default)]
    pub http: HttpConfig,

    /// 多书源聚合参数
    #[serde(default)]
    #[builder(default)]
    pub aggregator: AggregatorConfig,

    /// 内置书源的配置覆盖映射
    #[serde(default)]
    #[builder(default)]
    pub sources: HashMap<String, SourceConfig>,
}

/// HTTP 客户端配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    #[builder(default = default_user_agent())]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    #[builder(default = default_connect_timeout())]
    pub connect_timeout_secs: u64,
    /// 单次请求总超时，直接调用同样受其约束
    #[serde(default = "default_request_timeout")]
    #[builder(default = default_request_timeout())]
    pub request_timeout_secs: u64,
    #[serde(default = "default_pool_idle")]
    #[builder(default = default_pool_idle())]
    pub pool_max_idle_per_host: usize,
}

/// 聚合调度参数
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct AggregatorConfig {
    /// 扇出时单个书源的搜索时限
    #[serde(default = "default_search_timeout")]
    #[builder(default = default_search_timeout())]
    pub search_timeout_secs: u64,
    /// 整个扇出的总预算
    #[serde(default = "default_fanout_budget")]
    #[builder(default = default_fanout_budget())]
    pub fanout_budget_secs: u64,
}

/// 书源特定配置覆盖
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct SourceConfig {
    /// 自定义域名 (用于镜像站点)
    pub base_url: Option<String>,
    /// 书源独占 UA
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            pool_max_idle_per_host: default_pool_idle(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_timeout(),
            fanout_budget_secs: default_fanout_budget(),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AggregatorConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn fanout_budget(&self) -> Duration {
        Duration::from_secs(self.fanout_budget_secs)
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    15
}
fn default_pool_idle() -> usize {
    16
}
fn default_search_timeout() -> u64 {
    10
}
fn default_fanout_budget() -> u64 {
    20
}

impl AppConfig {
    /// 从工作目录的 `config.toml` 与环境变量加载配置
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// 从指定文件加载配置，文件不存在时仅使用默认值与环境变量
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder
            .add_source(Environment::with_prefix("BOOKHUB").separator("__"))
            .build()
            .map_err(SourceError::Config)?;
        settings.try_deserialize().map_err(SourceError::Config)
    }

    /// 获取书源配置覆盖，缺省时返回空配置
    pub fn source(&self, id: &str) -> SourceConfig {
        self.sources.get(id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_from(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(cfg.http.request_timeout_secs, 15);
        assert_eq!(cfg.aggregator.fanout_budget_secs, 20);
        assert!(cfg.source("fanqie").base_url.is_none());
    }

    #[test]
    fn builder_fills_defaults() {
        let cfg = AppConfig::builder()
            .aggregator(AggregatorConfig::builder().search_timeout_secs(1).build())
            .build();
        assert_eq!(cfg.aggregator.search_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.aggregator.fanout_budget_secs, 20);
        assert_eq!(cfg.http.user_agent, DEFAULT_USER_AGENT);
    }
}
