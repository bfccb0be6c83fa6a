//! 文本处理模块
//!
//! - `normalize`: 把原始文本映射为查找键，是匹配的唯一依据
//! - `discovery`: 在 DOM 中发现可翻译的文本节点

pub mod discovery;
pub mod normalize;

pub use discovery::{discover, Selector, SelectorSet, TextNodes};
pub use normalize::normalize;
