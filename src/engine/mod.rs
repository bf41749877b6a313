//! 聚合调度层

pub mod aggregator;

pub use aggregator::{Aggregator, UNKNOWN_CHAPTER, dedupe_books};
