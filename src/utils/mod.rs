use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde_json::Value;
use url::Url;

/// 与 `encodeURIComponent` 保持一致的保留字符集
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").unwrap());
static RE_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

pub fn to_absolute_url(base: &Url, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }

    if let Some(path_without_slashes) = href.strip_prefix("//") {
        return format!("{}://{}", base.scheme(), path_without_slashes);
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// URL 组件编码
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// 正文清洗 (Content Normalization)
///
/// 标签替换为换行，解码常见实体，去除行首缩进，连续 3 个以上换行压缩为 2 个。
pub fn clean_content(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n");
    let text = RE_TAG.replace_all(&text, "\n");
    let text = decode_entities(&text);

    let text = text
        .lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == '\u{3000}'))
        .collect::<Vec<_>>()
        .join("\n");

    RE_BLANK_LINES
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}

/// 解码常见 HTML 实体
pub fn decode_entities(text: &str) -> String {
    let text = RE_NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // &amp; 最后处理，避免二次解码
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// 确定性兜底标识
///
/// 书源响应缺少 ID 时，基于可用字段生成稳定的 ID，保证结果可复现。
pub fn fallback_id(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[0x1f]);
    }
    let mut hex = hasher.finalize().to_hex().to_string();
    hex.truncate(16);
    hex
}

/// JSON 标量转文本，空串与 null 视为缺失
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 按顺序取第一个存在的字段文本
pub fn pick_text(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| item.get(*k).and_then(value_text))
}

/// 按顺序取第一个可解析为整数的字段
pub fn pick_u64(item: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| match item.get(*k)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// 去重键规范化：去除首尾空白、折叠内部空白、小写
pub fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_content_strips_markup() {
        let raw = "<div id=\"content\">&nbsp;&nbsp;第一段<br/><br/><br/><br/>第二段 &lt;注&gt; &amp; 完</div>";
        assert_eq!(clean_content(raw), "第一段\n\n第二段 <注> & 完");
    }

    #[test]
    fn clean_content_trims_fullwidth_indent() {
        let raw = "\u{3000}\u{3000}天色渐暗。\n\n\n\n\u{3000}\u{3000}少年启程。";
        assert_eq!(clean_content(raw), "天色渐暗。\n\n少年启程。");
    }

    #[test]
    fn numeric_entities_are_decoded_once() {
        assert_eq!(decode_entities("&#26007;&#x7834; &amp;lt;"), "斗破 &lt;");
    }

    #[test]
    fn encode_component_matches_js() {
        assert_eq!(encode_component("斗 破"), "%E6%96%97%20%E7%A0%B4");
        assert_eq!(encode_component("a-b_c.d!~*'()"), "a-b_c.d!~*'()");
        assert_eq!(encode_component("a/b?c=d&e"), "a%2Fb%3Fc%3Dd%26e");
    }

    #[test]
    fn fallback_id_is_deterministic() {
        let a = fallback_id(&["fanqie", "斗破苍穹", "天蚕土豆"]);
        assert_eq!(a, fallback_id(&["fanqie", "斗破苍穹", "天蚕土豆"]));
        assert_ne!(a, fallback_id(&["fanqie", "斗破苍穹", "辰东"]));
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn absolute_url_resolution() {
        let base = Url::parse("https://www.xbiquge.so").unwrap();
        assert_eq!(to_absolute_url(&base, "/book/1/"), "https://www.xbiquge.so/book/1/");
        assert_eq!(to_absolute_url(&base, "//img.x.com/a.jpg"), "https://img.x.com/a.jpg");
        assert_eq!(to_absolute_url(&base, "http://a/b"), "http://a/b");
    }

    #[test]
    fn pick_helpers_skip_missing_and_blank() {
        let item = serde_json::json!({"book_name": "", "title": "斗破苍穹", "word_count": "3000", "n": 5});
        assert_eq!(pick_text(&item, &["book_name", "title"]).as_deref(), Some("斗破苍穹"));
        assert_eq!(pick_text(&item, &["n"]).as_deref(), Some("5"));
        assert_eq!(pick_text(&item, &["missing"]), None);
        assert_eq!(pick_u64(&item, &["word_count"]), Some(3000));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn normalize_key_folds_case_and_space() {
        assert_eq!(normalize_key("  Dou  Po\tCang "), "dou po cang");
    }
}
