//! 笔趣阁书源模块 (HTML Scraping)
//!
//! 基于固定页面结构的抓取实现，作为备用书源。解析逻辑全部收敛在本模块内，
//! 可整体替换为基于规则的提取引擎而不影响聚合层。

mod fetcher;
mod indexer;
mod selectors;

use async_trait::async_trait;
use url::Url;

use crate::core::error::Result;
use crate::core::model::{BookDetail, BookSearchResult, ChapterInfo};
use crate::interfaces::BookSource;
use crate::network::{ServiceContext, Session, SourceClient};
use crate::utils::{encode_component, to_absolute_url};

pub use self::selectors::SiteSelectors;

pub(crate) const ID: &str = "biquge";
const DEFAULT_BASE: &str = "https://www.xbiquge.so";

/// 笔趣阁书源实现
pub struct BiqugeSource {
    base: Url,
    client: SourceClient,
}

impl BiqugeSource {
    /// 创建新的笔趣阁书源实例
    pub fn new(ctx: &ServiceContext) -> Result<Self> {
        let base_url = ctx
            .source_config(ID)
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE.to_string());

        Ok(Self {
            base: Url::parse(&base_url)?,
            client: ctx.client_for(ID, Session::new()),
        })
    }

    /// 规范化 URL
    #[inline]
    fn normalize(&self, path: &str) -> String {
        to_absolute_url(&self.base, path)
    }

    fn book_url(&self, book_id: &str) -> String {
        self.normalize(&format!("/book/{}/", encode_component(book_id)))
    }
}

#[async_trait]
impl BookSource for BiqugeSource {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "笔趣阁"
    }

    fn base_url(&self) -> &str {
        self.base.as_str()
    }

    async fn search(&self, keyword: &str, _page: u32) -> Result<Vec<BookSearchResult>> {
        let url = self.normalize(&format!("/search.php?q={}", encode_component(keyword)));
        let html = self.client.get_text(&url).await?;
        Ok(indexer::parse_search(&html))
    }

    async fn book_detail(&self, book_id: &str) -> Result<BookDetail> {
        let html = self.client.get_text(&self.book_url(book_id)).await?;
        indexer::parse_detail(book_id, &html, &self.base)
    }

    async fn chapter_list(&self, book_id: &str) -> Result<Vec<ChapterInfo>> {
        let html = self.client.get_text(&self.book_url(book_id)).await?;
        Ok(indexer::parse_chapters(&html))
    }

    async fn chapter_content(&self, book_id: &str, chapter_id: &str) -> Result<String> {
        let url = self.normalize(&format!(
            "/book/{}/{}.html",
            encode_component(book_id),
            encode_component(chapter_id)
        ));
        let html = self.client.get_text(&url).await?;
        fetcher::parse_content(&html)
    }
}
