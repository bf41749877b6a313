//! 多书源聚合器 (Aggregator)
//!
//! 负责单书源路由、全书源扇出搜索与结果去重，并合并内置与导入书源的列表。

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, warn};

use crate::core::config::AggregatorConfig;
use crate::core::error::{Result, SourceError};
use crate::core::model::{
    BookDetail, BookSearchResult, ChapterContent, ChapterInfo, ImportSummary, ImportedSource,
    SourceDescriptor, SourceKind,
};
use crate::interfaces::BookSource;
use crate::legado::{RuleEngine, is_imported_id};
use crate::network::ServiceContext;
use crate::sources::SourceRegistry;
use crate::utils::normalize_key;

/// 章节标题无法解析时的占位标题
pub const UNKNOWN_CHAPTER: &str = "未知章节";

/// 聚合器
pub struct Aggregator {
    registry: SourceRegistry,
    rules: Arc<RuleEngine>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(registry: SourceRegistry, rules: Arc<RuleEngine>, config: AggregatorConfig) -> Self {
        Self {
            registry,
            rules,
            config,
        }
    }

    /// 以全部内置书源和一个空的规则引擎构建
    pub fn from_context(ctx: &ServiceContext) -> Result<Self> {
        let registry = SourceRegistry::builtin(ctx)?;
        let rules = Arc::new(RuleEngine::new(ctx.http.clone()));
        Ok(Self::new(registry, rules, ctx.config.aggregator.clone()))
    }

    pub fn rules(&self) -> &Arc<RuleEngine> {
        &self.rules
    }

    /// 内置书源在前（注册顺序），导入书源在后（导入顺序）
    pub fn list_sources(&self) -> Vec<SourceDescriptor> {
        let mut sources = self.registry.list();
        sources.extend(
            self.rules
                .list_imported()
                .into_iter()
                .map(|s| SourceDescriptor::new(s.id, s.name, SourceKind::Imported)),
        );
        sources
    }

    /// 搜索
    ///
    /// 指定书源时只查询该书源；未指定时并发查询全部内置书源，合并后去重。
    /// 只有书源标识无法识别时返回错误。
    pub async fn search(
        &self,
        keyword: &str,
        source_id: Option<&str>,
        page: u32,
    ) -> Result<Vec<BookSearchResult>> {
        let Some(id) = source_id else {
            return Ok(self.search_all(keyword, page).await);
        };

        if is_imported_id(id) {
            return Ok(self.rules.search(id, keyword, page).await);
        }

        let source = self.source(id)?;
        match source.search(keyword, page).await {
            Ok(books) => Ok(books),
            Err(e) => {
                warn!("书源 {} 搜索失败: {}", id, e);
                Ok(Vec::new())
            }
        }
    }

    /// 扇出搜索：每个书源独立任务，全部结束（成功、失败、超时或 panic）后再合并
    async fn search_all(&self, keyword: &str, page: u32) -> Vec<BookSearchResult> {
        let start = Instant::now();
        let deadline =
            (start + self.config.search_timeout()).min(start + self.config.fanout_budget());

        let (ids, handles): (Vec<String>, Vec<_>) = self
            .registry
            .iter()
            .map(|source| {
                let source = source.clone();
                let id = source.id().to_string();
                let keyword = keyword.to_string();
                let handle = tokio::spawn(async move {
                    timeout_at(deadline, source.search(&keyword, page))
                        .await
                        .unwrap_or_else(|_| {
                            Err(SourceError::Timeout(format!("书源 {} 搜索超时", source.id())))
                        })
                });
                (id, handle)
            })
            .unzip();

        let mut books = Vec::new();
        for (id, settled) in ids.iter().zip(join_all(handles).await) {
            match settled {
                Ok(Ok(found)) => {
                    debug!("书源 {} 返回 {} 条结果", id, found.len());
                    books.extend(found);
                }
                Ok(Err(e)) => warn!("书源 {} 搜索失败: {}", id, e),
                Err(e) => error!("书源 {} 搜索任务异常: {}", id, e),
            }
        }

        debug!(
            "扇出搜索完成: {} 条结果, 耗时 {:?}",
            books.len(),
            start.elapsed()
        );
        dedupe_books(books)
    }

    /// 书籍详情，书源错误原样上抛
    pub async fn book_detail(&self, source_id: &str, book_id: &str) -> Result<BookDetail> {
        self.source(source_id)?.book_detail(book_id).await
    }

    /// 章节目录，书源错误降级为空列表
    pub async fn chapter_list(&self, source_id: &str, book_id: &str) -> Result<Vec<ChapterInfo>> {
        let source = self.source(source_id)?;
        Ok(source
            .chapter_list(book_id)
            .await
            .unwrap_or_else(|e| {
                warn!("书源 {} 获取目录失败: {}", source_id, e);
                Vec::new()
            }))
    }

    /// 章节正文
    ///
    /// 正文与目录并发获取，标题取自目录中 ID 相同的章节，找不到时使用占位标题。
    pub async fn chapter_content(
        &self,
        source_id: &str,
        book_id: &str,
        chapter_id: &str,
    ) -> Result<ChapterContent> {
        let source = self.source(source_id)?;
        let (content, chapters) = tokio::join!(
            source.chapter_content(book_id, chapter_id),
            source.chapter_list(book_id)
        );

        let content = content.unwrap_or_else(|e| {
            warn!("书源 {} 获取正文失败: {}", source_id, e);
            String::new()
        });
        let title = chapters
            .unwrap_or_else(|e| {
                warn!("书源 {} 获取目录失败: {}", source_id, e);
                Vec::new()
            })
            .into_iter()
            .find(|c| c.id == chapter_id)
            .map(|c| c.title)
            .unwrap_or_else(|| UNKNOWN_CHAPTER.to_string());

        Ok(ChapterContent { title, content })
    }

    pub async fn import_sources(&self, input: &str) -> Result<ImportSummary> {
        self.rules.import_sources(input).await
    }

    pub fn list_imported(&self) -> Vec<ImportedSource> {
        self.rules.list_imported()
    }

    pub fn remove_imported(&self, id: &str) -> bool {
        self.rules.remove_imported(id)
    }

    pub fn clear_imported(&self) {
        self.rules.clear_imported()
    }

    fn source(&self, id: &str) -> Result<&Arc<dyn BookSource>> {
        self.registry
            .get(id)
            .ok_or_else(|| SourceError::SourceNotFound(id.to_string()))
    }
}

/// 按规范化后的（书名, 作者）去重，保留首次出现的条目与原有顺序
pub fn dedupe_books(books: Vec<BookSearchResult>) -> Vec<BookSearchResult> {
    let mut seen = HashSet::new();
    books
        .into_iter()
        .filter(|b| seen.insert((normalize_key(&b.title), normalize_key(&b.author))))
        .collect()
}
