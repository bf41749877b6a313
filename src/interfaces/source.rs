//! 书源定义
//!
//! 定义了每个书源适配器需要实现的能力接口。

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::model::{BookDetail, BookSearchResult, ChapterInfo};

/// 书源适配器 Trait
///
/// 每个内置书源实现此 Trait，提供：
/// - 书源标识
/// - 搜索、详情、目录、正文四项能力
///
/// 适配器本身无可变状态，四项能力相互独立、各自可失败。
/// 失败的降级策略由聚合层统一决定：搜索、目录、正文降级为空，详情上抛。
#[async_trait]
pub trait BookSource: Send + Sync {
    /// 书源唯一标识
    fn id(&self) -> &str;

    /// 展示名称
    fn name(&self) -> &str;

    /// 基础 URL
    fn base_url(&self) -> &str;

    /// 搜索书籍，`page` 从 1 开始
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<BookSearchResult>>;

    /// 获取书籍详情，未知 ID 返回 `BookNotFound`
    async fn book_detail(&self, book_id: &str) -> Result<BookDetail>;

    /// 获取章节列表，没有章节时返回空列表
    async fn chapter_list(&self, book_id: &str) -> Result<Vec<ChapterInfo>>;

    /// 获取清洗后的章节正文
    async fn chapter_content(&self, book_id: &str, chapter_id: &str) -> Result<String>;
}
