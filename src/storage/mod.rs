//! 存储管理模块
//!
//! - `snapshot`: 文本节点原文快照
//! - `table`: 按语言缓存的翻译表

pub mod snapshot;
pub mod table;

pub use snapshot::{NodeKey, SnapshotEntry, SnapshotStore, WriteOutcome, WriteSummary};
pub use table::{fetch_table, TranslationCache, TranslationTable};
