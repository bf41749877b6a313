//! 笔趣阁选择器
//!
//! 预编译的 CSS 选择器

use std::sync::OnceLock;

use scraper::Selector;

/// 站点选择器集合
pub struct SiteSelectors {
    pub link: Selector,
    pub title: Selector,
    pub paragraph: Selector,
    pub intro: Selector,
    pub cover: Selector,
    pub chapter_link: Selector,
    pub content: Selector,
}

static SELECTORS: OnceLock<SiteSelectors> = OnceLock::new();

impl SiteSelectors {
    /// 获取全局选择器实例
    pub fn get() -> &'static SiteSelectors {
        SELECTORS.get_or_init(|| SiteSelectors {
            link: Selector::parse("a[href]").unwrap(),
            title: Selector::parse("h1").unwrap(),
            paragraph: Selector::parse("p").unwrap(),
            intro: Selector::parse("#intro p").unwrap(),
            cover: Selector::parse("#fmimg img").unwrap(),
            chapter_link: Selector::parse("dd > a[href]").unwrap(),
            content: Selector::parse("div#content").unwrap(),
        })
    }
}
