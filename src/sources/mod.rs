//! 书源模块
//!
//! 包含所有内置书源实现和书源注册表

pub mod biquge;
pub mod demo;
pub mod fanqie;
pub mod zhuishu;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::error::Result;
use crate::core::model::{SourceDescriptor, SourceKind};
use crate::interfaces::BookSource;
use crate::network::ServiceContext;

pub use biquge::BiqugeSource;
pub use demo::DemoSource;
pub use fanqie::FanqieSource;
pub use zhuishu::ZhuishuSource;

// =============================================================================
// 书源注册表
// =============================================================================

/// 书源注册表
///
/// 按注册顺序保存内置书源，交给聚合层后不再变更。
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: IndexMap<String, Arc<dyn BookSource>>,
}

impl SourceRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置书源
    pub fn builtin(ctx: &ServiceContext) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(DemoSource::new()));
        registry.register(Arc::new(FanqieSource::new(ctx)));
        registry.register(Arc::new(ZhuishuSource::new(ctx)));
        registry.register(Arc::new(BiqugeSource::new(ctx)?));
        Ok(registry)
    }

    /// 注册书源，同 ID 的书源会被替换
    pub fn register(&mut self, source: Arc<dyn BookSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn BookSource>> {
        self.sources.get(id)
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn BookSource>> {
        self.sources.values()
    }

    /// 列出所有已注册的书源
    pub fn list(&self) -> Vec<SourceDescriptor> {
        self.iter()
            .map(|s| SourceDescriptor::new(s.id(), s.name(), SourceKind::Builtin))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;

    #[test]
    fn builtin_registration_order_is_stable() {
        let ctx = ServiceContext::new(Arc::new(AppConfig::default())).unwrap();
        let registry = SourceRegistry::builtin(&ctx).unwrap();
        let ids: Vec<_> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["demo", "fanqie", "zhuishu", "biquge"]);
        assert!(registry.list().iter().all(|d| d.kind == SourceKind::Builtin));
    }

    #[test]
    fn base_url_override_is_applied() {
        let mut config = AppConfig::default();
        config.sources.insert(
            "biquge".into(),
            crate::core::config::SourceConfig::builder()
                .base_url("https://mirror.example".into())
                .build(),
        );
        let ctx = ServiceContext::new(Arc::new(config)).unwrap();
        let registry = SourceRegistry::builtin(&ctx).unwrap();
        assert_eq!(
            registry.get("biquge").unwrap().base_url(),
            "https://mirror.example/"
        );
    }
}
