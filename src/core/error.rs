//! 错误处理体系 (Error Handling System)
//!
//! 定义书源领域的错误类型、错误分类以及全局 Result 别名。

use strum::Display;
use thiserror::Error;

/// 错误分类 (Error Taxonomy)
///
/// 聚合层据此决定错误是上抛还是就地降级为空结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// 书源或书籍不存在，直接调用方必须感知
    NotFound,
    /// 单个书源的网络、超时或解析失败，聚合层降级为空
    Provider,
    /// 导入输入本身无法获取或解析
    ImportFatal,
    /// 配置等进程内部错误
    Internal,
}

/// 全局错误定义 (Book Source Domain Errors)
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// 未注册的书源标识
    #[error("书源 {0} 不存在")]
    SourceNotFound(String),

    #[error("书籍不存在: {source_id}/{book_id}")]
    BookNotFound { source_id: String, book_id: String },

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Custom(String),
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, SourceError>;

impl SourceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SourceError::SourceNotFound(_) | SourceError::BookNotFound { .. } => {
                ErrorCategory::NotFound
            }
            SourceError::ImportFailed(_) => ErrorCategory::ImportFatal,
            SourceError::Config(_) | SourceError::Custom(_) => ErrorCategory::Internal,
            SourceError::Network(_)
            | SourceError::Middleware(_)
            | SourceError::Serialization(_)
            | SourceError::InvalidUrl(_)
            | SourceError::Parse(_)
            | SourceError::Timeout(_) => ErrorCategory::Provider,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn book_not_found(source_id: &str, book_id: &str) -> Self {
        SourceError::BookNotFound {
            source_id: source_id.to_string(),
            book_id: book_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_errors_are_not_found() {
        assert!(SourceError::SourceNotFound("nope".into()).is_not_found());
        assert!(SourceError::book_not_found("demo", "42").is_not_found());
        assert_eq!(
            SourceError::Parse("bad".into()).category(),
            ErrorCategory::Provider
        );
        assert_eq!(
            SourceError::ImportFailed("x".into()).category().to_string(),
            "import_fatal"
        );
    }
}
