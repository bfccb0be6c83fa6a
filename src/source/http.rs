//! HTTP 翻译源
//!
//! 地址形如 `{base_url}/{document_path}?{cache_bust_param}={毫秒时间戳}`。

use std::time::Duration;

use url::Url;

use super::{document_path, parse_translation_document, RawTable, TranslationSource};
use crate::config::SourceConfig;
use crate::error::LoadError;

/// 通过 HTTP GET 获取翻译文档
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    document_path: String,
    cache_bust_param: String,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LoadError::Network(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            document_path: config.document_path.trim_start_matches('/').to_string(),
            cache_bust_param: config.cache_bust_param.clone(),
        })
    }

    /// 生成页面文档地址，附带防缓存参数
    pub fn document_url(&self, page_id: &str, stamp_millis: i64) -> Result<Url, LoadError> {
        let raw = format!(
            "{}/{}",
            self.base_url,
            document_path(&self.document_path, page_id)
        );
        let mut url = Url::parse(&raw).map_err(|e| LoadError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if !self.cache_bust_param.is_empty() {
            url.query_pairs_mut()
                .append_pair(&self.cache_bust_param, &stamp_millis.to_string());
        }

        Ok(url)
    }
}

impl TranslationSource for HttpSource {
    async fn fetch_translations(&self, lang: &str, page_id: &str) -> Result<RawTable, LoadError> {
        let url = self.document_url(page_id, chrono::Utc::now().timestamp_millis())?;
        tracing::debug!("获取翻译文档: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        parse_translation_document(&bytes, lang)
    }
}
