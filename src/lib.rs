//! # Pagelingo
//!
//! 为不受自己控制、加载后仍会被第三方代码不断改写的页面提供按需文本翻译：
//! 发现页面中的可读文本，记录原文，按当前语言替换译文，并在 DOM 变化时保持一致，
//! 随时可以恢复原文。
//!
//! ## 模块组织
//!
//! - `text` - 文本规范化与文本节点发现
//! - `storage` - 原文快照与翻译表缓存
//! - `source` - 翻译文档来源（HTTP、本地目录、内存）
//! - `engine` - 协调状态机、触发队列、变更订阅与会话驱动
//! - `switcher` - 语言切换控件与切换控制
//! - `location` - 由页面地址推导语言和页面标识
//! - `host` - 重绘钩子与导航接口
//! - `dom` - DOM 解析、遍历与序列化
//! - `config` / `env` - 配置文件与环境变量
//! - `error` - 错误类型

pub mod config;
pub mod dom;
pub mod engine;
pub mod env;
pub mod error;
pub mod host;
pub mod location;
pub mod source;
pub mod storage;
pub mod switcher;
pub mod text;

pub use config::{ConfigManager, EngineConfig};
pub use engine::{
    prerender, EngineState, MutationHub, PageSession, PassKind, PassReport, Reconciler,
    SessionExit, SessionHandle,
};
pub use error::{LingoError, LingoResult, LoadError};
pub use location::{LanguageSet, PageLocation, SessionState};
pub use source::{FileSource, StaticSource, TranslationSource};
pub use storage::{SnapshotStore, TranslationCache, TranslationTable};
pub use text::normalize;
