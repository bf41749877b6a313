//! 笔趣阁正文提取 (Content Fetcher)

use scraper::Html;

use crate::core::error::{Result, SourceError};
use crate::utils::clean_content;

use super::SiteSelectors;

/// 提取 `div#content` 正文并清洗
pub fn parse_content(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    let s = SiteSelectors::get();

    let node = doc
        .select(&s.content)
        .next()
        .ok_or_else(|| SourceError::Parse("Novel content container not found".into()))?;

    Ok(clean_content(&node.inner_html()))
}
