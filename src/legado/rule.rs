//! Legado 书源格式定义
//!
//! 字段名与 Legado / 阅读 App 导出的 JSON 保持一致，未知字段忽略。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 导入书源的 ID 命名空间前缀
pub const ID_PREFIX: &str = "legado_";

/// 搜索规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRule {
    pub book_list: Option<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub intro: Option<String>,
    pub cover_url: Option<String>,
    pub book_url: Option<String>,
    pub kind: Option<String>,
    pub last_chapter: Option<String>,
    pub word_count: Option<String>,
}

/// 详情规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookInfoRule {
    pub name: Option<String>,
    pub author: Option<String>,
    pub intro: Option<String>,
    pub cover_url: Option<String>,
    pub kind: Option<String>,
    pub last_chapter: Option<String>,
    pub toc_url: Option<String>,
    pub word_count: Option<String>,
}

/// 目录规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TocRule {
    pub chapter_list: Option<String>,
    pub chapter_name: Option<String>,
    pub chapter_url: Option<String>,
    pub is_volume: Option<String>,
    pub update_time: Option<String>,
}

/// 正文规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentRule {
    pub content: Option<String>,
    pub next_content_url: Option<String>,
    pub web_js: Option<String>,
    pub source_regex: Option<String>,
    pub replace_regex: Option<String>,
}

/// 发现规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExploreRule {
    pub book_list: Option<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub intro: Option<String>,
    pub cover_url: Option<String>,
    pub book_url: Option<String>,
}

/// Legado 书源定义 (RuleSet)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleSet {
    pub book_source_name: String,
    pub book_source_url: String,
    /// 0 = 文字, 1 = 音频
    #[serde(deserialize_with = "lenient_i64")]
    pub book_source_type: Option<i64>,
    pub book_source_group: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled_explore: Option<bool>,
    #[serde(deserialize_with = "lenient_i64")]
    pub weight: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub custom_order: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub last_update_time: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub respond_time: Option<i64>,
    /// 序列化的自定义请求头 JSON 对象
    pub header: Option<String>,

    pub search_url: Option<String>,
    pub rule_search: Option<SearchRule>,
    pub rule_book_info: Option<BookInfoRule>,
    pub rule_toc: Option<TocRule>,
    pub rule_content: Option<ContentRule>,

    pub explore_url: Option<String>,
    pub rule_explore: Option<ExploreRule>,
}

impl RuleSet {
    /// 名称与基础 URL 均非空才是合法书源
    pub fn is_valid(&self) -> bool {
        !self.book_source_name.trim().is_empty() && !self.book_source_url.trim().is_empty()
    }

    /// 未声明时视为启用
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    pub fn id(&self) -> String {
        source_id(&self.book_source_url)
    }
}

// 各版本导出的元数据类型不一致，数字常以字符串出现；无法识别的值视为缺失

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// 由书源 URL 生成确定性 ID
///
/// 对 UTF-16 码元做 `h = h * 31 + c` 形式的 32 位有符号滚动哈希，取绝对值后加前缀。
/// 同一 URL 总得到同一 ID，且前缀保证不与内置书源冲突。
pub fn source_id(url: &str) -> String {
    let hash = url.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    format!("{}{}", ID_PREFIX, hash.unsigned_abs())
}

/// 是否为导入书源的 ID
pub fn is_imported_id(id: &str) -> bool {
    id.starts_with(ID_PREFIX)
}
