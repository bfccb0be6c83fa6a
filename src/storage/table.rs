//! 翻译表与按语言缓存
//!
//! 翻译表的键在装入时统一经过 [`normalize`]，与快照条目的键同源。
//! 加载失败时缓存中不会出现该语言的条目。

use std::collections::HashMap;

use crate::error::{helpers::log_error, LoadError};
use crate::source::{RawTable, TranslationSource};
use crate::text::normalize;

/// 规范化键 → 译文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
}

impl TranslationTable {
    /// 由原始表构建
    ///
    /// 规范化后为空的键和空译文被丢弃。多个原文规范化为同一键时，按原文排序后最后一个生效，
    /// 保证结果与原始表的迭代顺序无关。
    pub fn from_raw(raw: RawTable) -> Self {
        let mut pairs: Vec<(String, String)> = raw.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = HashMap::with_capacity(pairs.len());
        for (source, translated) in pairs {
            let key = normalize(&source);
            if key.is_empty() || translated.is_empty() {
                continue;
            }
            entries.insert(key, translated);
        }

        Self { entries }
    }

    /// 精确查找
    pub fn lookup(&self, normalized_key: &str) -> Option<&str> {
        self.entries.get(normalized_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 从翻译源取表并规范化
///
/// 不持有任何缓存借用，可以在挂起点两侧安全使用。
pub async fn fetch_table<S>(source: &S, lang: &str, page_id: &str) -> Result<TranslationTable, LoadError>
where
    S: TranslationSource,
{
    let raw = match source.fetch_translations(lang, page_id).await {
        Ok(raw) => raw,
        Err(error) => return log_error(error.with_context(format!("{}/{}", page_id, lang))),
    };

    let table = TranslationTable::from_raw(raw);
    tracing::info!("已加载翻译表: 页面={} 语言={} 条目={}", page_id, lang, table.len());
    Ok(table)
}

/// 会话内的翻译表缓存，每种语言至多加载一次
#[derive(Debug, Default)]
pub struct TranslationCache {
    tables: HashMap<String, TranslationTable>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 装入某语言的表，已存在时保留旧表
    pub fn install(&mut self, lang: &str, table: TranslationTable) -> &TranslationTable {
        self.tables.entry(lang.to_string()).or_insert(table)
    }

    pub fn get(&self, lang: &str) -> Option<&TranslationTable> {
        self.tables.get(lang)
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.tables.contains_key(lang)
    }

    /// 加载并装入
    ///
    /// 已缓存的语言不会再次请求翻译源。失败时不重试，也不装入任何内容。
    pub async fn load<S>(&mut self, source: &S, lang: &str, page_id: &str) -> Result<&TranslationTable, LoadError>
    where
        S: TranslationSource,
    {
        if !self.tables.contains_key(lang) {
            let table = fetch_table(source, lang, page_id).await?;
            self.tables.insert(lang.to_string(), table);
        }

        self.tables
            .get(lang)
            .ok_or_else(|| LoadError::Parse(format!("语言 {} 的翻译表未装入", lang)))
    }
}
