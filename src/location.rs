//! 页面位置与会话状态
//!
//! 语言由地址上的查询参数携带，页面标识取路径的最后一个非空段。

use std::fmt;

use url::Url;

use crate::config::EngineConfig;
use crate::error::LingoResult;

/// 支持的语言集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    supported: Vec<String>,
    default: String,
}

impl LanguageSet {
    pub fn new(supported: Vec<String>, default: &str) -> Self {
        Self {
            supported,
            default: default.to_string(),
        }
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    pub fn default_lang(&self) -> &str {
        &self.default
    }

    pub fn is_supported(&self, lang: &str) -> bool {
        self.supported.iter().any(|l| l == lang)
    }

    pub fn is_default(&self, lang: &str) -> bool {
        self.default == lang
    }

    /// 缺失或不支持的语言回退到默认语言
    pub fn resolve(&self, requested: Option<&str>) -> String {
        match requested {
            Some(lang) if self.is_supported(lang) => lang.to_string(),
            _ => self.default.clone(),
        }
    }
}

/// 当前页面地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(input: &str) -> LingoResult<Self> {
        Ok(Self {
            url: Url::parse(input)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 查询参数的原始值（第一个）
    pub fn query_value(&self, param: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == param)
            .map(|(_, value)| value.into_owned())
    }

    /// 解析当前语言
    pub fn language(&self, languages: &LanguageSet, param: &str) -> String {
        languages.resolve(self.query_value(param).as_deref())
    }

    /// 页面标识：路径最后一个非空段，路径为空时使用 `fallback`
    pub fn page_id(&self, fallback: &str) -> String {
        self.url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|segment| segment.to_string())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// 生成携带新语言的地址，其余查询参数保持原样
    pub fn with_language(&self, param: &str, lang: &str) -> Url {
        let others: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != param)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &others {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(param, lang);
        }
        url
    }
}

impl From<Url> for PageLocation {
    fn from(url: Url) -> Self {
        Self { url }
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// 会话状态，每次（重新）初始化时从地址推导
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub language: String,
    pub page_id: String,
}

impl SessionState {
    pub fn resolve(location: &PageLocation, config: &EngineConfig) -> Self {
        Self {
            language: location.language(&config.language_set(), &config.languages.query_param),
            page_id: location.page_id(&config.page.fallback_id),
        }
    }
}
