//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::{helpers::config_error, LingoError, LingoResult};
use crate::location::LanguageSet;
use crate::text::discovery::{Selector, SelectorSet};

/// 引擎配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub languages: LanguageConfig,
    pub page: PageConfig,
    pub source: SourceConfig,
    pub discovery: DiscoveryConfig,
    pub schedule: ScheduleConfig,
    pub switcher: SwitcherConfig,
}

/// 语言配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub supported: Vec<String>,
    pub default: String,
    pub query_param: String,
}

/// 页面标识配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PageConfig {
    /// 路径为空时使用的页面标识
    pub fallback_id: String,
}

/// 翻译源配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// 文档路径模板，`{page}` 会被替换为页面标识
    pub document_path: String,
    pub cache_bust_param: String,
    pub timeout_secs: u64,
}

/// 文本发现配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub container_selectors: Vec<String>,
    pub opaque_tags: Vec<String>,
    pub excluded_ids: Vec<String>,
}

/// 调度配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub rescan_interval_ms: u64,
    pub debounce_ms: u64,
    pub retry_failed_loads: bool,
}

/// 语言切换方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchMode {
    /// 更新地址并整页重载
    #[default]
    Navigate,
    /// 原地恢复原文后应用新语言
    InPlace,
}

/// 语言切换器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwitcherConfig {
    pub enabled: bool,
    pub mode: SwitchMode,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            supported: constants::SUPPORTED_LANGS.iter().map(|s| s.to_string()).collect(),
            default: constants::DEFAULT_LANG.to_string(),
            query_param: constants::LANG_QUERY_PARAM.to_string(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            fallback_id: constants::FALLBACK_PAGE_ID.to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_SOURCE_URL.to_string(),
            document_path: constants::DEFAULT_DOCUMENT_PATH.to_string(),
            cache_bust_param: constants::CACHE_BUST_PARAM.to_string(),
            timeout_secs: constants::DEFAULT_FETCH_TIMEOUT.as_secs(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            container_selectors: constants::CONTAINER_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            opaque_tags: constants::OPAQUE_TAGS.iter().map(|s| s.to_string()).collect(),
            excluded_ids: vec![constants::SWITCHER_ID.to_string()],
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            rescan_interval_ms: constants::DEFAULT_RESCAN_INTERVAL.as_millis() as u64,
            debounce_ms: constants::DEFAULT_DEBOUNCE.as_millis() as u64,
            retry_failed_loads: true,
        }
    }
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: SwitchMode::Navigate,
        }
    }
}

impl EngineConfig {
    /// 验证配置
    pub fn validate(&self) -> LingoResult<()> {
        if self.languages.supported.is_empty() {
            return Err(config_error("支持的语言列表不能为空"));
        }

        if !self.languages.supported.contains(&self.languages.default) {
            return Err(config_error(format!(
                "默认语言 {} 不在支持列表中",
                self.languages.default
            )));
        }

        if self.languages.query_param.trim().is_empty() {
            return Err(config_error("语言参数名不能为空"));
        }

        if self.page.fallback_id.trim().is_empty() {
            return Err(config_error("默认页面标识不能为空"));
        }

        if !self.source.document_path.contains(constants::PAGE_PLACEHOLDER) {
            return Err(config_error(format!(
                "文档路径必须包含 {} 占位符",
                constants::PAGE_PLACEHOLDER
            )));
        }

        if self.schedule.rescan_interval_ms == 0 {
            return Err(config_error("重扫间隔不能为0"));
        }

        if self.discovery.container_selectors.is_empty() {
            return Err(config_error("容器选择器不能为空"));
        }

        for selector in &self.discovery.container_selectors {
            Selector::parse(selector)?;
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) -> LingoResult<()> {
        use crate::env::{languages, schedule, source, EnvVar};

        if let Some(supported) = languages::Supported::get_explicit()? {
            self.languages.supported = supported;
        }

        if let Some(default) = languages::DefaultLang::get_explicit()? {
            self.languages.default = default;
        }

        if let Some(base_url) = source::BaseUrl::get_explicit()? {
            self.source.base_url = base_url;
            tracing::info!("环境变量覆盖翻译源地址: {}", self.source.base_url);
        }

        if let Some(interval) = schedule::RescanInterval::get_explicit()? {
            self.schedule.rescan_interval_ms = interval.as_millis() as u64;
        }

        if let Some(debounce) = schedule::Debounce::get_explicit()? {
            self.schedule.debounce_ms = debounce.as_millis() as u64;
        }

        if let Some(retry) = schedule::RetryFailedLoads::get_explicit()? {
            self.schedule.retry_failed_loads = retry;
        }

        Ok(())
    }

    /// 构建语言集合
    pub fn language_set(&self) -> LanguageSet {
        LanguageSet::new(self.languages.supported.clone(), &self.languages.default)
    }

    /// 构建选择器集合
    pub fn selector_set(&self) -> LingoResult<SelectorSet> {
        SelectorSet::from_config(&self.discovery)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.schedule.rescan_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.schedule.debounce_ms)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: EngineConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> LingoResult<Self> {
        let config = Self::load_config()?;
        Self::finish(config)
    }

    /// 从指定文件创建配置管理器
    pub fn from_path(path: &str) -> LingoResult<Self> {
        Self::load_dotenv();
        let expanded_path = shellexpand::tilde(path);
        let config = Self::load_from_file(&expanded_path)?;
        Self::finish(config)
    }

    fn finish(mut config: EngineConfig) -> LingoResult<Self> {
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> LingoResult<EngineConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(EngineConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> LingoResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LingoError::Config(format!("读取配置文件失败 {}: {}", path, e)))?;

        if path.ends_with(".json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> LingoResult<()> {
        let content = toml::to_string_pretty(&EngineConfig::default())?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.languages.default, "ru");
        assert_eq!(config.rescan_interval(), Duration::from_millis(3000));
    }

    #[test]
    fn test_default_language_must_be_supported() {
        let mut config = EngineConfig::default();
        config.languages.default = "de".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = EngineConfig::default();
        config.discovery.container_selectors.push("[id^=\"x\"]".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [languages]
            supported = ["en", "de"]
            default = "en"

            [schedule]
            rescan_interval_ms = 500

            [switcher]
            mode = "in_place"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.languages.query_param, "lang");
        assert_eq!(config.schedule.debounce_ms, 50);
        assert_eq!(config.switcher.mode, SwitchMode::InPlace);
        assert_eq!(config.page.fallback_id, "index");
    }

    #[test]
    fn test_document_path_needs_placeholder() {
        let mut config = EngineConfig::default();
        config.source.document_path = "translations/all.json".to_string();
        assert!(config.validate().is_err());
    }
}
