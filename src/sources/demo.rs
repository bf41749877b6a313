//! 示例书库 (Demo Source)
//!
//! 固定的内存书目，结果完全确定，用于演示与测试。

use async_trait::async_trait;

use crate::core::error::{Result, SourceError};
use crate::core::model::{BookDetail, BookSearchResult, BookStatus, ChapterInfo};
use crate::interfaces::BookSource;

const ID: &str = "demo";

struct DemoBook {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    cover: Option<&'static str>,
    description: &'static str,
    category: &'static str,
    chapter_count: u32,
}

const BOOKS: &[DemoBook] = &[
    DemoBook {
        id: "1",
        title: "西游记",
        author: "吴承恩",
        cover: Some("https://img.qidian.com/covers/xyj.jpg"),
        description: "《西游记》是中国古代第一部浪漫主义章回体长篇神魔小说。该书以\"唐僧取经\"这一历史事件为蓝本，通过作者的艺术加工，深刻地描绘了当时的社会现实。",
        category: "古典名著",
        chapter_count: 100,
    },
    DemoBook {
        id: "2",
        title: "三国演义",
        author: "罗贯中",
        cover: Some("https://img.qidian.com/covers/sgyy.jpg"),
        description: "《三国演义》是中国古典四大名著之一，是中国第一部长篇章回体历史演义小说，全名为《三国志通俗演义》。",
        category: "古典名著",
        chapter_count: 120,
    },
    DemoBook {
        id: "3",
        title: "水浒传",
        author: "施耐庵",
        cover: Some("https://img.qidian.com/covers/shz.jpg"),
        description: "《水浒传》是中国历史上第一部用白话文写成的章回小说，也是中国古典四大名著之一。",
        category: "古典名著",
        chapter_count: 120,
    },
    DemoBook {
        id: "4",
        title: "红楼梦",
        author: "曹雪芹",
        cover: Some("https://img.qidian.com/covers/hlm.jpg"),
        description: "《红楼梦》是中国古典四大名著之首，清代作家曹雪芹创作的章回体长篇小说。",
        category: "古典名著",
        chapter_count: 120,
    },
    DemoBook {
        id: "5",
        title: "斗破苍穹",
        author: "天蚕土豆",
        cover: None,
        description: "这是一个属于斗气的世界，没有花俏艳丽的魔法，有的，仅仅是繁衍到巅峰的斗气！",
        category: "玄幻",
        chapter_count: 1648,
    },
    DemoBook {
        id: "6",
        title: "完美世界",
        author: "辰东",
        cover: None,
        description: "一粒尘可填海，一根草斩尽日月星辰，弹指间天翻地覆。",
        category: "玄幻",
        chapter_count: 2014,
    },
];

const SAMPLE_CHAPTERS: [&str; 10] = [
    "第一章 序章",
    "第二章 初遇",
    "第三章 觉醒",
    "第四章 修炼",
    "第五章 突破",
    "第六章 对决",
    "第七章 胜利",
    "第八章 新程",
    "第九章 挑战",
    "第十章 巅峰",
];

/// 目录生成上限
const MAX_CHAPTERS: u32 = 100;

const SAMPLE_CONTENT: &str = "天色渐暗，夕阳的余晖洒在青石板路上，将整个小镇染成了一片金黄。

少年背着简单的行囊，踏上了这条未知的道路。他的眼中满是对未来的期待，却也带着一丝离家的惆怅。

\"既然选择了这条路，就要走到底。\"他在心中暗暗发誓。

远处的山峦层叠，云雾缭绕，仿佛隐藏着无数的秘密。传说在那深山之中，有着无数的机缘与危险。

少年深吸一口气，迈开了坚定的步伐。他知道，从这一刻起，他的人生将会完全不同。

路边的老树上，一只乌鸦发出沙哑的叫声，似乎在为他送行，又似乎在警告着什么。

但少年没有回头，他的目光始终望向前方，那片充满未知的世界。

......

这一走，便是十年。

十年后，当少年再次回到这条青石板路时，他已不再是当年那个懵懂的少年。

他的眼中多了几分沧桑，却也多了几分从容。

\"终于回来了。\"他轻声说道，嘴角浮现出一丝微笑。";

/// 示例书源
#[derive(Debug, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        Self
    }

    fn find(&self, book_id: &str) -> Option<&'static DemoBook> {
        BOOKS.iter().find(|b| b.id == book_id)
    }

    fn detail_of(book: &DemoBook) -> BookDetail {
        BookDetail {
            cover: book.cover.map(str::to_string),
            description: Some(book.description.to_string()),
            category: Some(book.category.to_string()),
            status: Some(BookStatus::Completed),
            chapter_count: Some(book.chapter_count),
            ..BookDetail::new(book.id, book.title, book.author, ID)
        }
    }

    /// 章节字数：由书籍与序号决定的伪随机值，范围 [2000, 5000)
    fn word_count(book_id: &str, index: u32) -> u32 {
        let digest = blake3::hash(format!("{}:{}", book_id, index).as_bytes());
        let bytes = digest.as_bytes();
        let n = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        2000 + n % 3000
    }
}

#[async_trait]
impl BookSource for DemoSource {
    fn id(&self) -> &str {
        ID
    }

    fn name(&self) -> &str {
        "示例书库"
    }

    fn base_url(&self) -> &str {
        ""
    }

    async fn search(&self, keyword: &str, _page: u32) -> Result<Vec<BookSearchResult>> {
        Ok(BOOKS
            .iter()
            .filter(|b| {
                b.title.contains(keyword)
                    || b.author.contains(keyword)
                    || b.description.contains(keyword)
            })
            .map(|b| Self::detail_of(b).to_search_result())
            .collect())
    }

    async fn book_detail(&self, book_id: &str) -> Result<BookDetail> {
        self.find(book_id)
            .map(Self::detail_of)
            .ok_or_else(|| SourceError::book_not_found(ID, book_id))
    }

    async fn chapter_list(&self, book_id: &str) -> Result<Vec<ChapterInfo>> {
        let Some(book) = self.find(book_id) else {
            return Ok(vec![]);
        };

        let count = book.chapter_count.min(MAX_CHAPTERS);
        Ok((0..count)
            .map(|i| ChapterInfo {
                id: (i + 1).to_string(),
                title: SAMPLE_CHAPTERS
                    .get(i as usize)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| format!("第{}章", i + 1)),
                index: i,
                word_count: Some(Self::word_count(book.id, i)),
            })
            .collect())
    }

    async fn chapter_content(&self, _book_id: &str, _chapter_id: &str) -> Result<String> {
        Ok(SAMPLE_CONTENT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_matches_title_substring() {
        let books = DemoSource::new().search("斗", 1).await.unwrap();
        assert!(books.iter().any(|b| b.title.contains("斗破苍穹")));
        assert!(books.iter().all(|b| b.source == "demo"));
    }

    #[tokio::test]
    async fn search_matches_author_and_description() {
        let source = DemoSource::new();
        let by_author = source.search("辰东", 1).await.unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].title, "完美世界");

        let by_desc = source.search("四大名著", 1).await.unwrap();
        assert_eq!(by_desc.len(), 3);
        assert!(source.search("不存在的书", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_book_detail_is_not_found() {
        let err = DemoSource::new().book_detail("404").await.unwrap_err();
        assert!(err.is_not_found());

        let detail = DemoSource::new().book_detail("1").await.unwrap();
        assert_eq!(detail.title, "西游记");
        assert_eq!(detail.chapter_count, Some(100));
    }

    #[tokio::test]
    async fn chapter_list_is_contiguous_and_capped() {
        let source = DemoSource::new();
        let chapters = source.chapter_list("5").await.unwrap();
        assert_eq!(chapters.len(), 100);
        assert_eq!(chapters[0].title, "第一章 序章");
        assert_eq!(chapters[10].title, "第11章");
        assert!(chapters.iter().enumerate().all(|(i, c)| c.index == i as u32));
        assert!(
            chapters
                .iter()
                .all(|c| (2000..5000).contains(&c.word_count.unwrap()))
        );

        // 字数在多次调用间保持一致
        assert_eq!(chapters, source.chapter_list("5").await.unwrap());
        assert!(source.chapter_list("404").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn content_has_no_repeated_blank_lines() {
        let text = DemoSource::new().chapter_content("1", "1").await.unwrap();
        assert!(text.starts_with("天色渐暗"));
        assert!(!text.contains("\n\n\n"));
    }
}
