//! 配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{
    ConfigManager, DiscoveryConfig, EngineConfig, LanguageConfig, PageConfig, ScheduleConfig,
    SourceConfig, SwitchMode, SwitcherConfig,
};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 语言设置
    pub const SUPPORTED_LANGS: &[&str] = &["ru", "en", "th"];
    pub const DEFAULT_LANG: &str = "ru";
    pub const LANG_QUERY_PARAM: &str = "lang";

    // 页面标识
    pub const FALLBACK_PAGE_ID: &str = "index";

    // 翻译源
    pub const DEFAULT_SOURCE_URL: &str = "https://raw.githubusercontent.com/blacklydman/WHYMORE/master";
    pub const DEFAULT_DOCUMENT_PATH: &str = "translations/{page}.json";
    pub const PAGE_PLACEHOLDER: &str = "{page}";
    pub const CACHE_BUST_PARAM: &str = "t";
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

    // 调度
    pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_millis(3000);
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

    // 文本容器选择器（页面构建器的文本类在前）
    pub const CONTAINER_SELECTORS: &[&str] = &[
        ".t-text", ".t-title", ".t-descr",
        ".t-cover__title", ".t-cover__text",
        "[class*=\"tn_text_\"]", "[class*=\"tn_atitle_\"]",
        "p", "h1", "h2", "h3", "span", "div",
        "header", ".t-header",
    ];

    // 不下探的元素
    pub const OPAQUE_TAGS: &[&str] = &["script", "style"];

    // 语言切换器
    pub const SWITCHER_ID: &str = "tilda-lang-switcher";

    // 重绘时需要触碰的元素
    pub const REDRAW_SELECTORS: &[&str] = &["img", ".t-animation"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "pagelingo.toml",
        ".pagelingo.toml",
        "~/.config/pagelingo/config.toml",
        "/etc/pagelingo/config.toml",
    ];
}
