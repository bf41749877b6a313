//! 多书源书库聚合
//!
//! 内置书源适配器、并发聚合搜索，以及基于 Legado 规则的用户导入书源。

pub mod core;
pub mod engine;
pub mod interfaces;
pub mod legado;
pub mod network;
pub mod sources;
pub mod utils;
