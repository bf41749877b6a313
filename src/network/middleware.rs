use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::debug;

use crate::network::session::Session;

/// 会话注入中间件
/// 负责在每次请求前，将书源 Session 中的 UA 与自定义 Header 注入请求
pub struct SessionMiddleware;

#[async_trait::async_trait]
impl Middleware for SessionMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if let Some(session) = extensions.get::<Arc<Session>>() {
            let headers = req.headers_mut();

            if let Some(ua) = session.ua()
                && let Ok(val) = HeaderValue::from_str(ua)
            {
                headers.insert(USER_AGENT, val);
            }

            // 自定义 Header 覆盖同名的默认值
            for (k, v) in session.headers().iter() {
                headers.insert(k.clone(), v.clone());
            }
        }
        next.run(req, extensions).await
    }
}

/// 请求日志中间件
pub struct LoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().to_string();
        let started = Instant::now();

        let result = next.run(req, extensions).await;
        match &result {
            Ok(resp) => debug!(
                "{} {} -> {} ({:?})",
                method,
                url,
                resp.status(),
                started.elapsed()
            ),
            Err(e) => debug!("{} {} failed after {:?}: {}", method, url, started.elapsed(), e),
        }
        result
    }
}
