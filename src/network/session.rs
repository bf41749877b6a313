use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

/// 书源请求画像 (Request Profile)
///
/// 每个书源持有一份，由 `SessionMiddleware` 在发送前注入请求头。
#[derive(Debug, Default, Clone)]
pub struct Session {
    ua: Option<String>,
    extra_headers: HeaderMap,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ua(mut self, ua: impl Into<String>) -> Self {
        self.ua = Some(ua.into());
        self
    }

    /// 追加单个请求头，非法的名称或值会被忽略
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(k), Ok(v)) => {
                self.extra_headers.insert(k, v);
            }
            _ => debug!("忽略非法请求头: {}", name),
        }
        self
    }

    pub fn ua(&self) -> Option<&str> {
        self.ua.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    pub fn is_empty(&self) -> bool {
        self.ua.is_none() && self.extra_headers.is_empty()
    }
}
