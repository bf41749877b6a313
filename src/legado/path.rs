//! 字段路径求值 (Path Evaluator)
//!
//! 规则作者依赖可选字段语义：任一层级遇到 `null` 或缺失都返回 `None`，不报错。

use serde_json::Value;

/// 对 JSON 值求值点分路径，如 `data.list` 或 `$.data.list`
///
/// 对象按键取值，数组按数字下标取值。
pub fn evaluate<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    let path = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix('$'))
        .unwrap_or(path);
    if path.is_empty() {
        return None;
    }

    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    (!current.is_null()).then_some(current)
}
