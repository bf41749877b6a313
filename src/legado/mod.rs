//! 规则书源引擎 (Rule Engine)
//!
//! 导入、校验、保存用户提供的 Legado 书源，并按规则执行搜索。
//! 导入书源存储只在本模块内修改，进程退出即丢失。

pub mod path;
pub mod rule;
pub mod template;

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::error::{Result, SourceError};
use crate::core::model::{BookSearchResult, ImportSummary, ImportedSource};
use crate::network::client::content_type;
use crate::network::{HttpService, Session, SourceClient};
use crate::utils::{fallback_id, pick_text, value_text};

pub use self::rule::{RuleSet, SearchRule, is_imported_id, source_id};

const UNKNOWN: &str = "未知";

/// 规则书源引擎
pub struct RuleEngine {
    store: RwLock<IndexMap<String, RuleSet>>,
    http: Arc<HttpService>,
}

impl RuleEngine {
    pub fn new(http: Arc<HttpService>) -> Self {
        Self {
            store: RwLock::new(IndexMap::new()),
            http,
        }
    }

    /// 导入书源
    ///
    /// `input` 为 JSON 文本或 HTTP(S) 地址。只有输入整体无法获取或解析时才返回错误，
    /// 单个条目不合法只计入失败数。
    pub async fn import_sources(&self, input: &str) -> Result<ImportSummary> {
        let input = input.trim();
        let text = if input.starts_with("http://") || input.starts_with("https://") {
            debug!("从远程地址导入书源: {}", input);
            SourceClient::new(self.http.clone(), Session::new().with_ua(template::DEFAULT_RULE_UA))
                .get_text(input)
                .await
                .map_err(|e| SourceError::ImportFailed(format!("书源地址获取失败: {}", e)))?
        } else {
            input.to_string()
        };

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| SourceError::ImportFailed(format!("书源 JSON 解析失败: {}", e)))?;

        let summary = self.import_value(payload);
        info!(
            "书源导入完成: 成功 {} 个, 失败 {} 个",
            summary.success, summary.failed
        );
        Ok(summary)
    }

    /// 逐条校验后在同一次写锁内批量写入
    fn import_value(&self, payload: Value) -> ImportSummary {
        let items = match payload {
            Value::Array(items) => items,
            other => vec![other],
        };

        let mut summary = ImportSummary::default();
        let mut accepted = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<RuleSet>(item) {
                Ok(rule) if rule.is_valid() => accepted.push((rule.id(), rule)),
                Ok(rule) => {
                    debug!("跳过缺少名称或地址的书源: {:?}", rule.book_source_name);
                    summary.failed += 1;
                }
                Err(e) => {
                    debug!("跳过无法识别的书源条目: {}", e);
                    summary.failed += 1;
                }
            }
        }

        summary.success = accepted.len();
        let mut store = self.store.write();
        for (id, rule) in accepted {
            store.insert(id, rule);
        }
        summary
    }

    /// 按导入顺序列出
    pub fn list_imported(&self) -> Vec<ImportedSource> {
        self.store
            .read()
            .iter()
            .map(|(id, rule)| ImportedSource {
                id: id.clone(),
                name: rule.book_source_name.clone(),
                url: rule.book_source_url.clone(),
                enabled: rule.is_enabled(),
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<RuleSet> {
        self.store.read().get(id).cloned()
    }

    /// 删除导入书源，返回删除前是否存在
    pub fn remove_imported(&self, id: &str) -> bool {
        // shift_remove 保持其余条目的导入顺序
        self.store.write().shift_remove(id).is_some()
    }

    pub fn clear_imported(&self) {
        self.store.write().clear();
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// 在指定导入书源上搜索
    ///
    /// 导入书源可信度较低，任何失败都只记录日志并返回空列表。
    pub async fn search(&self, id: &str, keyword: &str, page: u32) -> Vec<BookSearchResult> {
        let Some(rule) = self.get(id) else {
            debug!("导入书源 {} 不存在", id);
            return Vec::new();
        };
        let Some(url) = template::build_search_url(&rule, keyword, page) else {
            debug!("导入书源 {} 未配置 searchUrl", id);
            return Vec::new();
        };

        match self.fetch_search(id, &rule, &url).await {
            Ok(books) => books,
            Err(e) => {
                warn!("导入书源 {} 搜索失败: {}", id, e);
                Vec::new()
            }
        }
    }

    async fn fetch_search(
        &self,
        id: &str,
        rule: &RuleSet,
        url: &str,
    ) -> Result<Vec<BookSearchResult>> {
        let client = SourceClient::new(
            self.http.clone(),
            template::build_session(rule.header.as_deref()),
        );
        let resp = client.get(url).await?;

        let ctype = content_type(&resp);
        if !is_json_type(&ctype) {
            // HTML 规则提取尚未实现
            warn!(
                "导入书源 {} 返回非 JSON 响应 ({})，暂不支持 HTML 规则",
                id, ctype
            );
            return Ok(Vec::new());
        }

        let payload: Value = resp.json().await?;
        Ok(parse_search_json(&payload, rule, id))
    }
}

fn is_json_type(ctype: &str) -> bool {
    ctype.contains("application/json") || ctype.contains("+json")
}

/// 按 `ruleSearch` 将 JSON 响应映射为搜索结果
///
/// `bookList` 缺省时整个响应即列表；非数组值视为单元素列表；非对象元素跳过。
pub fn parse_search_json(
    payload: &Value,
    rule: &RuleSet,
    source_id: &str,
) -> Vec<BookSearchResult> {
    let Some(search) = rule.rule_search.as_ref() else {
        return Vec::new();
    };

    let list = match non_blank(search.book_list.as_deref()) {
        Some(list_path) => match path::evaluate(payload, list_path) {
            Some(list) => list,
            None => return Vec::new(),
        },
        None => payload,
    };

    let items: Vec<&Value> = match list {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    items
        .into_iter()
        .filter(|item| item.is_object())
        .map(|item| map_book(item, search, source_id))
        .collect()
}

fn map_book(item: &Value, search: &SearchRule, source_id: &str) -> BookSearchResult {
    let title = field(item, search.name.as_deref(), "name").unwrap_or_else(|| UNKNOWN.into());
    let author =
        field(item, search.author.as_deref(), "author").unwrap_or_else(|| UNKNOWN.into());

    let id = pick_text(item, &["id", "bookId", "book_id"])
        .or_else(|| {
            non_blank(search.book_url.as_deref())
                .and_then(|p| path::evaluate(item, p))
                .and_then(value_text)
        })
        .unwrap_or_else(|| fallback_id(&[source_id, &title, &author]));

    BookSearchResult {
        cover: field(item, search.cover_url.as_deref(), "cover"),
        description: field(item, search.intro.as_deref(), "intro"),
        category: field(item, search.kind.as_deref(), "category"),
        last_chapter: field(item, search.last_chapter.as_deref(), "lastChapter"),
        ..BookSearchResult::new(id, title, author, source_id)
    }
}

/// 规则缺省时按同名字段读取
fn field(item: &Value, rule: Option<&str>, default_key: &str) -> Option<String> {
    let rule_path = non_blank(rule).unwrap_or(default_key);
    path::evaluate(item, rule_path).and_then(value_text)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HttpConfig;
    use crate::core::error::ErrorCategory;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn engine() -> RuleEngine {
        RuleEngine::new(Arc::new(HttpService::new(&HttpConfig::default()).unwrap()))
    }

    fn rule_with(search: SearchRule) -> RuleSet {
        RuleSet {
            book_source_name: "测试".into(),
            book_source_url: "https://api.example.com".into(),
            rule_search: Some(search),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn import_list_remove_lifecycle() {
        let engine = engine();
        let summary = engine
            .import_sources(r#"{"bookSourceName":"X","bookSourceUrl":"http://a"}"#)
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary { success: 1, failed: 0 });

        let listed = engine.list_imported();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "X");
        assert_eq!(listed[0].id, source_id("http://a"));
        assert!(listed[0].enabled);

        assert!(engine.remove_imported(&listed[0].id));
        assert!(!engine.remove_imported(&listed[0].id));
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn invalid_elements_are_counted_not_raised() {
        let engine = engine();
        let summary = engine
            .import_sources(
                r#"[
                    {"bookSourceName":"A","bookSourceUrl":"http://a"},
                    {"bookSourceName":"","bookSourceUrl":"http://b"},
                    {"bookSourceName":"C"},
                    {"bookSourceName":"D","bookSourceUrl":42},
                    "not an object",
                    {"bookSourceName":"E","bookSourceUrl":"http://e"}
                ]"#,
            )
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary { success: 2, failed: 4 });
        let names: Vec<_> = engine.list_imported().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["A", "E"]);
    }

    #[tokio::test]
    async fn reimport_is_idempotent_and_keeps_position() {
        let engine = engine();
        engine
            .import_sources(
                r#"[{"bookSourceName":"A","bookSourceUrl":"http://a"},
                    {"bookSourceName":"B","bookSourceUrl":"http://b"}]"#,
            )
            .await
            .unwrap();
        engine
            .import_sources(r#"{"bookSourceName":"A2","bookSourceUrl":"http://a","enabled":false}"#)
            .await
            .unwrap();

        let listed = engine.list_imported();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "A2");
        assert!(!listed[0].enabled);
        assert_eq!(listed[1].name, "B");

        engine.clear_imported();
        assert!(engine.list_imported().is_empty());
    }

    #[tokio::test]
    async fn string_typed_metadata_is_accepted() {
        let engine = engine();
        for element in [
            r#"{"bookSourceName":"X","bookSourceUrl":"http://a","weight":"0"}"#,
            r#"{"bookSourceName":"X","bookSourceUrl":"http://a","bookSourceType":"0"}"#,
            r#"{"bookSourceName":"X","bookSourceUrl":"http://a","enabled":"true"}"#,
        ] {
            let summary = engine.import_sources(element).await.unwrap();
            assert_eq!(summary, ImportSummary { success: 1, failed: 0 });
        }
        assert_eq!(engine.len(), 1);
    }

    #[tokio::test]
    async fn unparseable_input_is_fatal() {
        let err = engine().import_sources("not json at all").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ImportFatal);
    }

    #[tokio::test]
    async fn search_without_rule_or_template_is_empty() {
        let engine = engine();
        assert!(engine.search("legado_1", "斗", 1).await.is_empty());

        engine
            .import_sources(r#"{"bookSourceName":"X","bookSourceUrl":"http://a"}"#)
            .await
            .unwrap();
        assert!(engine.search(&source_id("http://a"), "斗", 1).await.is_empty());
    }

    /// 本地单次 HTTP 服务，返回收到的原始请求
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&request).to_lowercase()
        });
        (base, handle)
    }

    async fn import_local(engine: &RuleEngine, base: &str) -> String {
        let source = json!({
            "bookSourceName": "本地",
            "bookSourceUrl": base,
            "searchUrl": "/search?q={{key}}&p={{page}}",
            "header": r#"{"Referer":"https://ref.example"}"#,
            "ruleSearch": {"bookList": "data.list", "name": "title"}
        });
        engine.import_sources(&source.to_string()).await.unwrap();
        source_id(base)
    }

    #[tokio::test]
    async fn search_sends_templated_request_and_maps_json() {
        let (base, server) = serve_once(
            "200 OK",
            "application/json; charset=utf-8",
            r#"{"data":{"list":[{"id":"1","title":"斗破苍穹","author":"天蚕土豆"}]}}"#,
        )
        .await;
        let engine = engine();
        let id = import_local(&engine, &base).await;

        let books = engine.search(&id, "斗", 2).await;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "斗破苍穹");
        assert_eq!(books[0].author, "天蚕土豆");
        assert_eq!(books[0].source, id);

        let request = server.await.unwrap();
        assert!(request.starts_with("get /search?q=%e6%96%97&p=2 http/1.1"));
        assert!(request.contains("referer: https://ref.example"));
        let ua = format!("user-agent: {}", template::DEFAULT_RULE_UA.to_lowercase());
        assert!(request.contains(&ua));
    }

    #[tokio::test]
    async fn html_response_degrades_to_empty() {
        let (base, server) = serve_once(
            "200 OK",
            "text/html; charset=utf-8",
            "<html><body><a href=\"/book/1\">斗破苍穹</a></body></html>",
        )
        .await;
        let engine = engine();
        let id = import_local(&engine, &base).await;

        assert!(engine.search(&id, "斗", 1).await.is_empty());
        assert!(server.await.unwrap().starts_with("get /search?"));
    }

    #[tokio::test]
    async fn failed_remote_import_is_fatal() {
        let (base, server) = serve_once("404 Not Found", "text/plain", "missing").await;
        let err = engine()
            .import_sources(&format!("{}/sources.json", base))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ImportFatal);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn remote_import_fetches_json() {
        let (base, server) = serve_once(
            "200 OK",
            "application/json",
            r#"[{"bookSourceName":"远程","bookSourceUrl":"http://remote"}]"#,
        )
        .await;
        let engine = engine();
        let summary = engine
            .import_sources(&format!("  {}/sources.json  ", base))
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary { success: 1, failed: 0 });
        assert_eq!(engine.list_imported()[0].name, "远程");
        assert!(server.await.unwrap().starts_with("get /sources.json"));
    }

    #[test]
    fn maps_json_with_rules_and_fallbacks() {
        let rule = rule_with(SearchRule {
            book_list: Some("$.data.list".into()),
            name: Some("title".into()),
            author: Some("info.author".into()),
            cover_url: Some("img".into()),
            ..Default::default()
        });
        let payload = json!({"data": {"list": [
            {"id": 7, "title": "斗破苍穹", "info": {"author": "天蚕土豆"},
             "img": "https://img/1.jpg", "intro": "斗气大陆", "category": "玄幻",
             "lastChapter": "大结局"},
            {"bookId": "b2", "title": null},
            42,
            {"book_id": "b3", "title": "  ", "info": null}
        ]}});

        let books = parse_search_json(&payload, &rule, "legado_9");
        assert_eq!(books.len(), 3);

        assert_eq!(books[0].id, "7");
        assert_eq!(books[0].title, "斗破苍穹");
        assert_eq!(books[0].author, "天蚕土豆");
        assert_eq!(books[0].cover.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(books[0].description.as_deref(), Some("斗气大陆"));
        assert_eq!(books[0].category.as_deref(), Some("玄幻"));
        assert_eq!(books[0].last_chapter.as_deref(), Some("大结局"));
        assert_eq!(books[0].source, "legado_9");

        assert_eq!(books[1].id, "b2");
        assert_eq!(books[1].title, UNKNOWN);
        assert_eq!(books[1].author, UNKNOWN);
        assert_eq!(books[2].id, "b3");
        assert_eq!(books[2].title, UNKNOWN);
    }

    #[test]
    fn id_falls_back_to_book_url_then_hash() {
        let rule = rule_with(SearchRule {
            book_url: Some("link".into()),
            ..Default::default()
        });
        let payload = json!([
            {"name": "甲", "author": "乙", "link": "/book/1"},
            {"name": "甲", "author": "乙"}
        ]);
        let books = parse_search_json(&payload, &rule, "legado_9");
        assert_eq!(books[0].id, "/book/1");
        assert_eq!(books[1].id, fallback_id(&["legado_9", "甲", "乙"]));
    }

    #[test]
    fn non_array_list_is_single_element() {
        let rule = rule_with(SearchRule {
            book_list: Some("data".into()),
            ..Default::default()
        });
        let books = parse_search_json(&json!({"data": {"name": "独本"}}), &rule, "legado_9");
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "独本");

        assert!(parse_search_json(&json!({"other": []}), &rule, "legado_9").is_empty());
    }

    #[test]
    fn missing_search_rule_yields_nothing() {
        let rule = RuleSet {
            book_source_name: "X".into(),
            book_source_url: "http://a".into(),
            ..Default::default()
        };
        assert!(parse_search_json(&json!([{"name": "甲"}]), &rule, "legado_9").is_empty());
    }

    #[test]
    fn json_content_types() {
        assert!(is_json_type("application/json; charset=utf-8"));
        assert!(is_json_type("application/vnd.api+json"));
        assert!(!is_json_type("text/html"));
        assert!(!is_json_type(""));
    }
}
