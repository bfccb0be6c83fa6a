//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，用于覆盖配置文件中的值

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 显式设置时解析其值，未设置时返回 `None`，不回落到默认值
    fn get_explicit() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "PAGELINGO_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 语言相关环境变量
pub mod languages {
    use super::*;

    /// 支持的语言列表（逗号分隔）
    pub struct Supported;
    impl EnvVar<Vec<String>> for Supported {
        const NAME: &'static str = "PAGELINGO_SUPPORTED_LANGS";
        const DEFAULT: Option<Vec<String>> = None;
        const DESCRIPTION: &'static str = "Comma separated list of supported language codes";

        fn parse(value: &str) -> EnvResult<Vec<String>> {
            let langs: Vec<String> = value
                .split(',')
                .map(|lang| lang.trim().to_lowercase())
                .filter(|lang| !lang.is_empty())
                .collect();

            if langs.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "At least one language code is required".to_string(),
                });
            }

            for lang in &langs {
                parse_lang_code(lang, Self::NAME)?;
            }

            Ok(langs)
        }
    }

    /// 默认语言（显示原文）
    pub struct DefaultLang;
    impl EnvVar<String> for DefaultLang {
        const NAME: &'static str = "PAGELINGO_DEFAULT_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Language whose selection shows the original page text";

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim().to_lowercase();
            parse_lang_code(&lang, Self::NAME)?;
            Ok(lang)
        }
    }
}

/// 翻译源相关环境变量
pub mod source {
    use super::*;

    /// 翻译文档基础地址
    pub struct BaseUrl;
    impl EnvVar<String> for BaseUrl {
        const NAME: &'static str = "PAGELINGO_SOURCE_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Base URL that translation documents are fetched from";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Source URL must start with http:// or https://".to_string(),
                })
            }
        }
    }
}

/// 调度相关环境变量
pub mod schedule {
    use super::*;

    /// 定时重扫间隔
    pub struct RescanInterval;
    impl EnvVar<Duration> for RescanInterval {
        const NAME: &'static str = "PAGELINGO_RESCAN_INTERVAL_MS";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Period of the unconditional re-scan timer in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis = parse_positive_usize(value, Self::NAME, 10, 3_600_000)?;
            Ok(Duration::from_millis(millis as u64))
        }
    }

    /// 触发合并的去抖时间
    pub struct Debounce;
    impl EnvVar<Duration> for Debounce {
        const NAME: &'static str = "PAGELINGO_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Window in which mutation and timer triggers collapse into one pass";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis = parse_positive_usize(value, Self::NAME, 0, 60_000)?;
            Ok(Duration::from_millis(millis as u64))
        }
    }

    /// 加载失败后是否在定时器上重试
    pub struct RetryFailedLoads;
    impl EnvVar<bool> for RetryFailedLoads {
        const NAME: &'static str = "PAGELINGO_RETRY_FAILED_LOADS";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Retry a failed translation table load on timer ticks";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_lang_code(lang: &str, var_name: &str) -> EnvResult<()> {
    let valid = (2..=8).contains(&lang.len())
        && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid language code '{}'", lang),
        })
    }
}

/// 生成环境变量文档
pub fn generate_env_docs() -> String {
    let rows: [(&str, &str); 8] = [
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (core::NoColor::NAME, core::NoColor::DESCRIPTION),
        (languages::Supported::NAME, languages::Supported::DESCRIPTION),
        (languages::DefaultLang::NAME, languages::DefaultLang::DESCRIPTION),
        (source::BaseUrl::NAME, source::BaseUrl::DESCRIPTION),
        (schedule::RescanInterval::NAME, schedule::RescanInterval::DESCRIPTION),
        (schedule::Debounce::NAME, schedule::Debounce::DESCRIPTION),
        (schedule::RetryFailedLoads::NAME, schedule::RetryFailedLoads::DESCRIPTION),
    ];

    let mut docs = String::from("ENVIRONMENT:\n");
    for (name, description) in rows {
        docs.push_str(&format!("    {:<32} {}\n", name, description));
    }
    docs
}
