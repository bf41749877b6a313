//! 追书神器书源 (Zhuishu JSON API)

use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::{Result, SourceError};
use crate::core::model::{BookDetail, BookSearchResult, BookStatus, ChapterInfo};
use crate::interfaces::BookSource;
use crate::network::{ServiceContext, Session, SourceClient};
use crate::utils::{clean_content, encode_component, fallback_id, pick_text, pick_u64};

const ID: &str = "zhuishu";
const DEFAULT_BASE: &str = "https://api.zhuishushenqi.com";
const STATICS: &str = "https://statics.zhuishushenqi.com";
const PAGE_SIZE: u32 = 20;

/// 追书神器书源
pub struct ZhuishuSource {
    base: String,
    client: SourceClient,
}

impl ZhuishuSource {
    pub fn new(ctx: &ServiceContext) -> Self {
        let base = ctx
            .source_config(ID)
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE.to_string());
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: ctx.client_for(ID, Session::new()),
        }
    }

    fn search_url(&self, keyword: &str, page: u32) -> String {
        format!(
            "{}/book/fuzzy-search?query={}&start={}&limit={}",
            self.base,
            encode_component(keyword),
            page.saturating_sub(1).saturating_mul(PAGE_SIZE),
            PAGE_SIZE
        )
    }
}

/// 相对路径封面补全静态资源域名
fn cover_url(item: &Value) -> Option<String> {
    pick_text(item, &["cover"]).map(|c| {
        if c.starts_with("http") {
            c
        } else {
            format!("{}{}", STATICS, c)
        }
    })
}

fn parse_status(item: &Value) -> Option<BookStatus> {
    item.get("isSerial").and_then(Value::as_bool).map(|serial| {
        if serial {
            BookStatus::Ongoing
        } else {
            BookStatus::Completed
        }
    })
}

pub(crate) fn parse_search(data: &Value) -> Vec<BookSearchResult> {
    data.get("books")
        .and_then(Value::as_array)
        .map(|books| {
            books
                .iter()
                .filter(|b| b.is_object())
                .map(|book| {
                    let title = pick_text(book, &["title"]).unwrap_or_else(|| "未知".into());
                    let author = pick_text(book, &["author"]).unwrap_or_else(|| "未知".into());
                    let id = pick_text(book, &["_id"])
                        .unwrap_or_else(|| fallback_id(&[ID, &title, &author]));

                    BookSearchResult {
                        cover: cover_url(book),
                        description: pick_text(book, &["shortIntro", "longIntro"]),
                        category: pick_text(book, &["cat"]),
                        last_chapter: pick_text(book, &["lastChapter"]),
                        status: parse_status(book),
                        ..BookSearchResult::new(id, title, author, ID)
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// 未知 ID 的响应（如 `{"ok":false}`）既无 `_id` 也无 `title`，视为书籍不存在
pub(crate) fn parse_detail(book_id: &str, book: &Value) -> Result<BookDetail> {
    if pick_text(book, &["_id", "title"]).is_none() {
        return Err(SourceError::book_not_found(ID, book_id));
    }

    Ok(BookDetail {
        cover: cover_url(book),
        description: pick_text(book, &["longIntro", "shortIntro"]),
        category: pick_text(book, &["cat"]),
        status: parse_status(book),
        last_chapter: pick_text(book, &["lastChapter"]),
        last_update_time: pick_text(book, &["updated"]),
        word_count: pick_u64(book, &["wordCount"]),
        chapter_count: pick_u64(book, &["chaptersCount"]).map(|n| n as u32),
        ..BookDetail::new(
            pick_text(book, &["_id"]).unwrap_or_else(|| book_id.to_string()),
            pick_text(book, &["title"]).unwrap_or_else(|| "未知".into()),
            pick_text(book, &["author"]).unwrap_or_else(|| "未知".into()),
            ID,
        )
    })
}

/// 目录源列表中取第一个源的 ID
pub(crate) fn first_toc_source(data: &Value) -> Option<String> {
    data.as_array()?.first().and_then(|s| pick_text(s, &["_id"]))
}

pub(crate) fn parse_chapters(data: &Value) -> Vec<ChapterInfo> {
    data.get("chapters")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|c| Some((pick_text(c, &["link"])?, c)))
                .enumerate()
                .map(|(index, (link, c))| ChapterInfo {
                    title: pick_text(c, &["title"]).unwrap_or_else(|| format!("第{}章", index + 1)),
                    id: link,
                    index: index as u32,
                    word_count: pick_u64(c, &["wordCount"]).map(|n| n as u32),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_content(data: &Value) -> String {
    data.pointer("/chapter/body")
        .and_then(Value::as_str)
        .map(clean_content)
        .unwrap_or_default()
}

#[async_trait]
impl BookSource for ZhuishuSource {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "追书神器"
    }

    fn base_url(&self) -> &str {
        &self.base
    }

    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<BookSearchResult>> {
        let data: Value = self.client.get_json(&self.search_url(keyword, page)).await?;
        Ok(parse_search(&data))
    }

    async fn book_detail(&self, book_id: &str) -> Result<BookDetail> {
        let url = format!("{}/book/{}", self.base, encode_component(book_id));
        let book: Value = self.client.get_json(&url).await?;
        parse_detail(book_id, &book)
    }

    async fn chapter_list(&self, book_id: &str) -> Result<Vec<ChapterInfo>> {
        // 先取目录源列表，再使用第一个源的章节
        let sources_url = format!(
            "{}/atoc?view=summary&book={}",
            self.base,
            encode_component(book_id)
        );
        let sources: Value = self.client.get_json(&sources_url).await?;
        let Some(toc_id) = first_toc_source(&sources) else {
            return Ok(vec![]);
        };

        let chapters_url = format!("{}/atoc/{}?view=chapters", self.base, toc_id);
        let data: Value = self.client.get_json(&chapters_url).await?;
        Ok(parse_chapters(&data))
    }

    async fn chapter_content(&self, _book_id: &str, chapter_link: &str) -> Result<String> {
        let url = format!("{}/chapter/{}", self.base, encode_component(chapter_link));
        let data: Value = self.client.get_json(&url).await?;
        Ok(parse_content(&data))
    }
}
