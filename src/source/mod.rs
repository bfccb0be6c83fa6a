//! 翻译源
//!
//! 翻译文档是一个 JSON 对象：顶层键为语言代码，值为 "原文 → 译文" 的扁平对象。
//! 文档中缺少所请求的语言时视为空表，不是错误。

#[cfg(feature = "http")]
pub mod http;

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::constants;
use crate::error::{helpers::parse_error, LoadError};

#[cfg(feature = "http")]
pub use http::HttpSource;

/// 未规范化的原始翻译表
pub type RawTable = HashMap<String, String>;

/// 翻译源接口
pub trait TranslationSource: Send + Sync + 'static {
    /// 获取指定语言和页面的原始翻译表
    fn fetch_translations(
        &self,
        lang: &str,
        page_id: &str,
    ) -> impl Future<Output = Result<RawTable, LoadError>> + Send;
}

/// 从翻译文档中取出指定语言的表
pub fn parse_translation_document(bytes: &[u8], lang: &str) -> Result<RawTable, LoadError> {
    let document: Value = serde_json::from_slice(bytes)?;

    let Value::Object(mut languages) = document else {
        return Err(parse_error("翻译文档顶层必须是对象"));
    };

    match languages.remove(lang) {
        None | Some(Value::Null) => Ok(RawTable::new()),
        Some(Value::Object(entries)) => Ok(table_from_entries(lang, entries)),
        Some(_) => Err(parse_error(format!("语言 {} 的翻译必须是对象", lang))),
    }
}

fn table_from_entries(lang: &str, entries: serde_json::Map<String, Value>) -> RawTable {
    let mut table = RawTable::with_capacity(entries.len());
    for (source, translated) in entries {
        match translated {
            Value::String(text) => {
                table.insert(source, text);
            }
            Value::Number(number) => {
                table.insert(source, number.to_string());
            }
            other => {
                tracing::debug!("跳过语言 {} 中无法作为文本使用的译文: {} => {}", lang, source, other);
            }
        }
    }
    table
}

/// 内存中的翻译文档
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: HashMap<String, HashMap<String, RawTable>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为页面添加一种语言的翻译
    pub fn with_table<I, K, V>(mut self, page_id: &str, lang: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.documents
            .entry(page_id.to_string())
            .or_default()
            .insert(lang.to_string(), table);
        self
    }
}

impl TranslationSource for StaticSource {
    async fn fetch_translations(&self, lang: &str, page_id: &str) -> Result<RawTable, LoadError> {
        let document = self
            .documents
            .get(page_id)
            .ok_or_else(|| LoadError::Status {
                status: 404,
                url: format!("static://{}", page_id),
            })?;

        Ok(document.get(lang).cloned().unwrap_or_default())
    }
}

/// 从本地目录读取 `{page}.json`
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn document_path(&self, page_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", page_id))
    }
}

impl TranslationSource for FileSource {
    async fn fetch_translations(&self, lang: &str, page_id: &str) -> Result<RawTable, LoadError> {
        let path = self.document_path(page_id);
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            // 与 HTTP 404 一致：文档不存在不值得重试
            io::ErrorKind::NotFound => LoadError::Status {
                status: 404,
                url: path.display().to_string(),
            },
            _ => LoadError::from(e).with_context(path.display()),
        })?;

        parse_translation_document(&bytes, lang)
    }
}

/// 由配置模板生成文档相对路径
pub fn document_path(template: &str, page_id: &str) -> String {
    template.replace(constants::PAGE_PLACEHOLDER, page_id)
}
