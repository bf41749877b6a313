//! 笔趣阁索引解析
//!
//! 负责从搜索页、详情页提取书籍信息与章节列表。页面结构一旦变动即失效，是可靠性最低的书源。

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use url::Url;

use crate::core::error::{Result, SourceError};
use crate::core::model::{BookDetail, BookSearchResult, ChapterInfo};
use crate::utils::to_absolute_url;

use super::{ID, SiteSelectors};

/// 搜索结果上限
const MAX_RESULTS: usize = 20;

static RE_BOOK_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/book/(\d+)/$").unwrap());
static RE_CHAPTER_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/book/\d+/(\d+)\.html$").unwrap());
static RE_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^作\s*者[：:]\s*(.+)$").unwrap());

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// 解析搜索页：书名链接指向 `/book/{id}/`
pub fn parse_search(html: &str) -> Vec<BookSearchResult> {
    let doc = Html::parse_document(html);
    let s = SiteSelectors::get();
    let mut seen = HashSet::new();

    doc.select(&s.link)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let id = RE_BOOK_HREF.captures(href)?.get(1)?.as_str().to_string();
            let title = element_text(a);
            if title.is_empty() {
                return None;
            }
            Some((id, title))
        })
        .filter(|(id, _)| seen.insert(id.clone()))
        .take(MAX_RESULTS)
        .map(|(id, title)| BookSearchResult::new(id, title, "未知", ID))
        .collect()
}

/// 解析详情页，缺少书名标题视为书籍不存在
pub fn parse_detail(book_id: &str, html: &str, base: &Url) -> Result<BookDetail> {
    let doc = Html::parse_document(html);
    let s = SiteSelectors::get();

    let title = doc
        .select(&s.title)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SourceError::book_not_found(ID, book_id))?;

    let author = doc
        .select(&s.paragraph)
        .map(element_text)
        .find_map(|text| {
            RE_AUTHOR
                .captures(&text)
                .map(|caps| caps[1].trim().to_string())
        })
        .unwrap_or_else(|| "未知".into());

    let description = doc
        .select(&s.intro)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty());

    let cover = doc
        .select(&s.cover)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| to_absolute_url(base, src));

    Ok(BookDetail {
        cover,
        description,
        ..BookDetail::new(book_id, title, author, ID)
    })
}

/// 解析目录
///
/// 页面顶部的“最新章节”区块会与正文目录重复，同一章节保留最后一次出现的位置。
pub fn parse_chapters(html: &str) -> Vec<ChapterInfo> {
    let doc = Html::parse_document(html);
    let s = SiteSelectors::get();

    let entries: Vec<(String, String)> = doc
        .select(&s.chapter_link)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let id = RE_CHAPTER_HREF.captures(href)?.get(1)?.as_str().to_string();
            Some((id, element_text(a)))
        })
        .collect();

    let last_pos: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(pos, (id, _))| (id.as_str(), pos))
        .collect();

    entries
        .iter()
        .enumerate()
        .filter(|(pos, (id, _))| last_pos.get(id.as_str()) == Some(pos))
        .enumerate()
        .map(|(index, (_, (id, title)))| ChapterInfo {
            id: id.clone(),
            title: title.clone(),
            index: index as u32,
            word_count: None,
        })
        .collect()
}
