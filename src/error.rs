//! 统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。
//!
//! 只有翻译表加载失败 (`LoadError`) 是真正的错误；
//! 未命中翻译 (MatchMiss) 和写入已失效节点 (StaleNodeWrite) 只计入 `PassReport`。

use std::fmt;

use thiserror::Error;

use crate::env::EnvError;

/// 翻译表加载错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 翻译源返回非成功状态码
    #[error("翻译源返回状态 {status}: {url}")]
    Status { status: u16, url: String },

    /// 翻译文档解析失败
    #[error("解析错误: {0}")]
    Parse(String),

    /// 本地读取失败
    #[error("读取错误: {0}")]
    Io(String),

    /// 文档地址无效
    #[error("无效的文档地址: {0}")]
    InvalidUrl(String),
}

impl LoadError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            LoadError::Network(_) => true,
            LoadError::Status { status, .. } => *status >= 500 || *status == 429,
            LoadError::Io(_) => true,
            LoadError::Parse(_) => false,
            LoadError::InvalidUrl(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LoadError::Network(_) => ErrorSeverity::Warning,
            LoadError::Status { .. } => ErrorSeverity::Warning,
            LoadError::Io(_) => ErrorSeverity::Warning,
            LoadError::Parse(_) => ErrorSeverity::Error,
            LoadError::InvalidUrl(_) => ErrorSeverity::Critical,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            LoadError::Network(msg) => LoadError::Network(wrap(msg)),
            LoadError::Parse(msg) => LoadError::Parse(wrap(msg)),
            LoadError::Io(msg) => LoadError::Io(wrap(msg)),
            LoadError::InvalidUrl(msg) => LoadError::InvalidUrl(wrap(msg)),
            status @ LoadError::Status { .. } => status,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        LoadError::Parse(format!("JSON解析错误: {}", error))
    }
}

impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        LoadError::Io(format!("IO错误: {}", error))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for LoadError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return LoadError::Status {
                status: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if error.is_decode() {
            LoadError::Parse(format!("响应解码失败: {}", error))
        } else {
            LoadError::Network(error.to_string())
        }
    }
}

/// 库级错误类型
#[derive(Error, Debug)]
pub enum LingoError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 翻译表加载失败
    #[error(transparent)]
    Load(#[from] LoadError),

    /// 环境变量错误
    #[error("环境变量错误: {0}")]
    Env(#[from] EnvError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// URL解析错误
    #[error("URL解析错误: {0}")]
    Url(#[from] url::ParseError),

    /// DOM处理错误
    #[error("DOM错误: {0}")]
    Dom(String),
}

impl From<toml::de::Error> for LingoError {
    fn from(error: toml::de::Error) -> Self {
        LingoError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<toml::ser::Error> for LingoError {
    fn from(error: toml::ser::Error) -> Self {
        LingoError::Config(format!("TOML序列化错误: {}", error))
    }
}

impl From<serde_json::Error> for LingoError {
    fn from(error: serde_json::Error) -> Self {
        LingoError::Config(format!("JSON解析错误: {}", error))
    }
}

/// 错误结果类型别名
pub type LingoResult<T> = Result<T, LingoError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录并返回错误
    pub fn log_error<T>(error: LoadError) -> Result<T, LoadError> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译表加载信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译表加载警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译表加载错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译表加载严重错误: {}", error),
        }

        Err(error)
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> LingoError {
        LingoError::Config(msg.to_string())
    }

    /// 创建解析错误
    pub fn parse_error<T: fmt::Display>(msg: T) -> LoadError {
        LoadError::Parse(msg.to_string())
    }
}
