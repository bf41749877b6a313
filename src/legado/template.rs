//! 请求模板 (Request Templater)
//!
//! 把书源中的 `searchUrl` 与 `header` 转换为可发送的请求。

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::legado::rule::RuleSet;
use crate::network::Session;
use crate::utils::{encode_component, to_absolute_url};

/// 导入书源的默认 UA
pub const DEFAULT_RULE_UA: &str = "Mozilla/5.0 (Linux; Android 11) AppleWebKit/537.36";

/// 生成搜索 URL，书源未声明 `searchUrl` 时返回 `None`
///
/// `{{key}}` 按 URI 组件编码后替换，`{{page}}` 替换为页码；相对地址以 `bookSourceUrl` 为基准补全。
pub fn build_search_url(rule: &RuleSet, keyword: &str, page: u32) -> Option<String> {
    let template = rule.search_url.as_deref()?.trim();
    if template.is_empty() {
        return None;
    }

    let url = template
        .replace("{{key}}", &encode_component(keyword))
        .replace("{{page}}", &page.to_string());

    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(url);
    }

    let base = rule.book_source_url.trim();
    Some(match Url::parse(base) {
        Ok(base) => to_absolute_url(&base, &url),
        Err(_) => format!("{}{}", base.trim_end_matches('/'), url),
    })
}

/// 构建请求画像：默认 UA 叠加书源 `header` 中声明的请求头
///
/// `header` 不是合法的 JSON 对象时整体忽略；非字符串值按 JSON 文本写入。
pub fn build_session(header: Option<&str>) -> Session {
    let session = Session::new().with_ua(DEFAULT_RULE_UA);
    let Some(raw) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return session;
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map.iter().fold(session, |session, (name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            session.with_header(name, &value)
        }),
        Ok(_) => {
            debug!("书源 header 不是对象，已忽略");
            session
        }
        Err(e) => {
            debug!("书源 header 解析失败，已忽略: {}", e);
            session
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::USER_AGENT;

    fn rule(url: &str, search: Option<&str>) -> RuleSet {
        RuleSet {
            book_source_name: "测试".into(),
            book_source_url: url.into(),
            search_url: search.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn substitutes_keyword_and_page() {
        let r = rule(
            "https://api.example.com",
            Some("https://api.example.com/s?q={{key}}&p={{page}}&again={{key}}"),
        );
        assert_eq!(
            build_search_url(&r, "斗 破", 2).unwrap(),
            "https://api.example.com/s?q=%E6%96%97%20%E7%A0%B4&p=2&again=%E6%96%97%20%E7%A0%B4"
        );
    }

    #[test]
    fn relative_url_resolves_against_source_url() {
        let r = rule("https://api.example.com/v1/", Some("/search?q={{key}}"));
        assert_eq!(
            build_search_url(&r, "a&b", 1).unwrap(),
            "https://api.example.com/search?q=a%26b"
        );

        let r = rule("not a url/", Some("/search?q={{key}}"));
        assert_eq!(build_search_url(&r, "x", 1).unwrap(), "not a url/search?q=x");
    }

    #[test]
    fn missing_search_url_yields_none() {
        assert!(build_search_url(&rule("http://a", None), "x", 1).is_none());
        assert!(build_search_url(&rule("http://a", Some("  ")), "x", 1).is_none());
    }

    #[test]
    fn header_json_overlays_default_ua() {
        let session = build_session(Some(r#"{"Referer":"https://a.com","X-Page":3}"#));
        assert_eq!(session.ua(), Some(DEFAULT_RULE_UA));
        assert_eq!(session.headers()["referer"], "https://a.com");
        assert_eq!(session.headers()["x-page"], "3");

        let session = build_session(Some(r#"{"User-Agent":"Custom/1.0"}"#));
        assert_eq!(session.headers()[USER_AGENT], "Custom/1.0");
    }

    #[test]
    fn malformed_header_is_ignored() {
        for header in [None, Some(""), Some("{oops"), Some("[1,2]")] {
            let session = build_session(header);
            assert_eq!(session.ua(), Some(DEFAULT_RULE_UA));
            assert!(session.headers().is_empty());
        }
    }
}
