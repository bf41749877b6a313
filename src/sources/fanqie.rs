//! 番茄小说书源 (Fanqie JSON API)
//!
//! 将第三方接口的响应信封 `data.*` 映射为统一的书籍、目录与正文结构。

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::core::error::{Result, SourceError};
use crate::core::model::{BookDetail, BookSearchResult, BookStatus, ChapterInfo};
use crate::interfaces::BookSource;
use crate::network::{ServiceContext, Session, SourceClient};
use crate::utils::{clean_content, encode_component, fallback_id, pick_text, pick_u64};

const ID: &str = "fanqie";
const DEFAULT_BASE: &str = "https://novel.snssdk.com";
const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X)";
const PAGE_SIZE: u32 = 10;

/// 番茄小说书源
pub struct FanqieSource {
    base: String,
    client: SourceClient,
}

impl FanqieSource {
    pub fn new(ctx: &ServiceContext) -> Self {
        let base = ctx
            .source_config(ID)
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE.to_string());
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: ctx.client_for(ID, Session::new().with_ua(MOBILE_UA)),
        }
    }

    fn search_url(&self, keyword: &str, page: u32) -> String {
        format!(
            "{}/api/novel/channel/homepage/search/search/v1/?aid=1967&offset={}&count={}&query={}",
            self.base,
            page.saturating_sub(1).saturating_mul(PAGE_SIZE),
            PAGE_SIZE,
            encode_component(keyword)
        )
    }

    fn directory_url(&self, book_id: &str) -> String {
        format!(
            "{}/api/novel/book/directory/list/v1/?book_id={}&aid=1967",
            self.base,
            encode_component(book_id)
        )
    }

    fn content_url(&self, chapter_id: &str) -> String {
        format!(
            "{}/api/novel/book/reader/full/v1/?item_id={}&aid=1967",
            self.base,
            encode_component(chapter_id)
        )
    }
}

/// `creation_status` 为 "0" 表示连载中
fn parse_status(item: &Value) -> Option<BookStatus> {
    match item.get("creation_status")? {
        Value::Null => None,
        Value::String(s) if s == "0" => Some(BookStatus::Ongoing),
        Value::Number(n) if n.as_u64() == Some(0) => Some(BookStatus::Ongoing),
        _ => Some(BookStatus::Completed),
    }
}

pub(crate) fn parse_search(data: &Value) -> Vec<BookSearchResult> {
    let Some(list) = data.pointer("/data/ret_data").and_then(Value::as_array) else {
        debug!("番茄搜索响应缺少 data.ret_data");
        return vec![];
    };

    list.iter()
        .filter(|item| item.is_object())
        .map(|item| {
            let title = pick_text(item, &["book_name", "title"]).unwrap_or_else(|| "未知".into());
            let author = pick_text(item, &["author"]).unwrap_or_else(|| "未知".into());
            let id = pick_text(item, &["book_id", "id"])
                .unwrap_or_else(|| fallback_id(&[ID, &title, &author]));

            BookSearchResult {
                cover: pick_text(item, &["thumb_url", "cover"]),
                description: pick_text(item, &["abstract", "intro"]),
                category: pick_text(item, &["category"]),
                last_chapter: pick_text(item, &["last_chapter_title"]),
                status: parse_status(item),
                ..BookSearchResult::new(id, title, author, ID)
            }
        })
        .collect()
}

/// 响应缺少 `data.book_info` 时视为书籍不存在
pub(crate) fn parse_detail(book_id: &str, data: &Value) -> Result<BookDetail> {
    let book = data
        .pointer("/data/book_info")
        .filter(|b| b.as_object().is_some_and(|m| !m.is_empty()))
        .ok_or_else(|| SourceError::book_not_found(ID, book_id))?;

    Ok(BookDetail {
        cover: pick_text(book, &["thumb_url"]),
        description: pick_text(book, &["abstract"]),
        category: pick_text(book, &["category"]),
        status: parse_status(book),
        last_chapter: pick_text(book, &["last_chapter_title"]),
        word_count: pick_u64(book, &["word_count"]),
        chapter_count: data
            .pointer("/data/item_data_list")
            .and_then(Value::as_array)
            .map(|list| list.len() as u32),
        ..BookDetail::new(
            book_id,
            pick_text(book, &["book_name"]).unwrap_or_else(|| "未知".into()),
            pick_text(book, &["author"]).unwrap_or_else(|| "未知".into()),
            ID,
        )
    })
}

pub(crate) fn parse_chapters(data: &Value) -> Vec<ChapterInfo> {
    data.pointer("/data/item_data_list")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|item| {
                    let id = pick_text(item, &["item_id"])?;
                    Some((id, item))
                })
                .enumerate()
                .map(|(index, (id, item))| ChapterInfo {
                    title: pick_text(item, &["title"]).unwrap_or_else(|| format!("第{}章", index + 1)),
                    id,
                    index: index as u32,
                    word_count: pick_u64(item, &["word_count"]).map(|n| n as u32),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_content(data: &Value) -> String {
    data.pointer("/data/content")
        .and_then(Value::as_str)
        .map(clean_content)
        .unwrap_or_default()
}

#[async_trait]
impl BookSource for FanqieSource {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "番茄小说"
    }

    fn base_url(&self) -> &str {
        &self.base
    }

    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<BookSearchResult>> {
        let data: Value = self.client.get_json(&self.search_url(keyword, page)).await?;
        Ok(parse_search(&data))
    }

    async fn book_detail(&self, book_id: &str) -> Result<BookDetail> {
        let data: Value = self.client.get_json(&self.directory_url(book_id)).await?;
        parse_detail(book_id, &data)
    }

    async fn chapter_list(&self, book_id: &str) -> Result<Vec<ChapterInfo>> {
        let data: Value = self.client.get_json(&self.directory_url(book_id)).await?;
        Ok(parse_chapters(&data))
    }

    async fn chapter_content(&self, _book_id: &str, chapter_id: &str) -> Result<String> {
        let data: Value = self.client.get_json(&self.content_url(chapter_id)).await?;
        Ok(parse_content(&data))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::config::AppConfig;
    use serde_json::json;

    #[test]
    fn maps_search_envelope() {
        let data = json!({
            "data": {
                "ret_data": [
                    {
                        "book_id": "7143038691944959011",
                        "book_name": "斗破苍穹",
                        "author": "天蚕土豆",
                        "thumb_url": "https://p3.fqnovel.com/a.jpg",
                        "abstract": "斗气大陆",
                        "category": "玄幻",
                        "last_chapter_title": "大结局",
                        "creation_status": "0"
                    },
                    {"title": "无名", "creation_status": 1},
                    "garbage"
                ]
            }
        });

        let books = parse_search(&data);
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].id, "7143038691944959011");
        assert_eq!(books[0].status, Some(BookStatus::Ongoing));
        assert_eq!(books[0].last_chapter.as_deref(), Some("大结局"));
        assert_eq!(books[1].author, "未知");
        assert_eq!(books[1].status, Some(BookStatus::Completed));
        assert_eq!(books[1].id, fallback_id(&[ID, "无名", "未知"]));
    }

    #[test]
    fn missing_envelope_yields_empty() {
        assert!(parse_search(&json!({"code": -1})).is_empty());
        assert!(parse_chapters(&json!({"data": null})).is_empty());
        assert_eq!(parse_content(&json!({})), "");
    }

    #[test]
    fn maps_directory_into_detail_and_chapters() {
        let data = json!({
            "data": {
                "book_info": {"book_name": "完美世界", "author": "辰东", "word_count": 6500000},
                "item_data_list": [
                    {"item_id": "a1", "title": "第一章", "word_count": 3012},
                    {"title": "缺少 ID"},
                    {"item_id": "a2", "title": "第二章"}
                ]
            }
        });

        let detail = parse_detail("42", &data).unwrap();
        assert_eq!(detail.title, "完美世界");
        assert_eq!(detail.word_count, Some(6_500_000));
        assert_eq!(detail.status, None);

        let chapters = parse_chapters(&data);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].id, "a2");
        assert_eq!(chapters[1].index, 1);
        assert_eq!(chapters[0].word_count, Some(3012));
    }

    #[test]
    fn missing_book_info_is_not_found() {
        for data in [
            json!({"code": 0, "data": {}}),
            json!({"code": 0, "data": {"book_info": {}}}),
            json!({"code": -1, "message": "book not exist"}),
        ] {
            let err = parse_detail("no-such-book", &data).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn search_offset_saturates_on_large_pages() {
        let ctx = ServiceContext::new(Arc::new(AppConfig::default())).unwrap();
        let source = FanqieSource::new(&ctx);
        assert!(source.search_url("x", 0).contains("offset=0&"));
        assert!(source.search_url("x", 3).contains("offset=20&"));
        assert!(source.search_url("x", u32::MAX).contains(&format!("offset={}&", u32::MAX)));
    }

    #[test]
    fn content_is_cleaned() {
        let data = json!({"data": {"content": "<p>第一段</p><p>第二段&nbsp;</p>"}});
        assert_eq!(parse_content(&data), "第一段\n\n第二段");
    }
}
